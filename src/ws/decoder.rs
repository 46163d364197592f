//! Streaming WebSocket frame decoder, RFC 6455 §5.
use bytes::{Buf, BytesMut};

use crate::error::Error;
use crate::h1::Limits;
use crate::result::CodecResult;
use crate::ws::close::{self, ClosingState, SharedClosingState};
use crate::ws::frame::{FrameHead, OpCode};
use crate::ws::mask;
use crate::ws::utf8::Utf8Validator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ReadingHead2,
    ReadingLength,
    ReadingMask,
    ReadingPayload,
}

/// A frame the decoder wants the encoder to send right away: an
/// automatic pong reply to a ping, or a close echoing the peer's status.
#[derive(Debug)]
pub struct AutoReply {
    pub opcode: OpCode,
    pub payload: BytesMut,
}

/// Outcome of one [`Decoder::decode`] call.
#[derive(Debug, Default)]
pub struct FrameResult {
    pub codec: CodecResult,
    /// Set once a frame's header and payload have both been fully read.
    pub head: Option<FrameHead>,
    pub reply: Option<AutoReply>,
    /// `true` when `reply` is an automatic protocol response (pong, close
    /// echo, or a synthesized close) with no application-visible frame to
    /// go with it.
    pub response_only: bool,
}

/// A streaming decoder for one direction of a WebSocket connection.
///
/// `expect_masked` must be `true` for a server decoding frames from a
/// client, and `false` for a client decoding frames from a server;
/// frames violating that expectation are a protocol error (close 1002).
#[derive(Debug)]
pub struct Decoder {
    expect_masked: bool,
    limits: Limits,
    state: State,
    fin: bool,
    opcode: OpCode,
    extra_len_bytes: usize,
    payload_len: u64,
    remaining: u64,
    mask_key: [u8; 4],
    mask_pos: usize,
    payload_start: usize,
    fragment_opcode: Option<OpCode>,
    utf8: Utf8Validator,
    closing: SharedClosingState,
}

impl Decoder {
    pub fn new(expect_masked: bool, limits: Limits, closing: SharedClosingState) -> Self {
        Self {
            expect_masked,
            limits,
            state: State::ReadingHead2,
            fin: true,
            opcode: OpCode::Continuation,
            extra_len_bytes: 0,
            payload_len: 0,
            remaining: 0,
            mask_key: [0; 4],
            mask_pos: 0,
            payload_start: 0,
            fragment_opcode: None,
            utf8: Utf8Validator::new(),
            closing,
        }
    }

    pub fn decode(&mut self, input: &mut BytesMut, out: &mut BytesMut) -> Result<FrameResult, Error> {
        if self.closing.get() == ClosingState::Closed {
            return Ok(FrameResult { codec: CodecResult { close_connection: true, ..CodecResult::default() }, ..FrameResult::default() });
        }

        loop {
            match self.state {
                State::ReadingHead2 => {
                    if input.len() < 2 {
                        return Ok(FrameResult { codec: CodecResult::underflow(), ..FrameResult::default() });
                    }
                    let b0 = input[0];
                    let b1 = input[1];
                    self.fin = b0 & 0x80 != 0;
                    let rsv = b0 & 0x70;
                    let opcode = OpCode::try_from_byte(b0 & 0x0F)
                        .ok_or_else(|| Error::protocol("unknown WebSocket opcode"))?;
                    let masked = b1 & 0x80 != 0;
                    let short_len = b1 & 0x7F;

                    if rsv != 0 {
                        return Ok(self.synth_close_now(1002));
                    }
                    if masked != self.expect_masked {
                        return Ok(self.synth_close_now(1002));
                    }
                    if opcode.is_control() && !self.fin {
                        return Ok(self.synth_close_now(1002));
                    }
                    if opcode == OpCode::Continuation && self.fragment_opcode.is_none() {
                        return Ok(self.synth_close_now(1002));
                    }

                    self.opcode = opcode;
                    self.extra_len_bytes = match short_len {
                        126 => 2,
                        127 => 8,
                        n => {
                            self.payload_len = n as u64;
                            0
                        }
                    };
                    input.advance(2);
                    self.state = if self.extra_len_bytes > 0 {
                        State::ReadingLength
                    } else if self.expect_masked {
                        State::ReadingMask
                    } else {
                        self.begin_payload(out)?;
                        State::ReadingPayload
                    };
                }
                State::ReadingLength => {
                    if input.len() < self.extra_len_bytes {
                        return Ok(FrameResult { codec: CodecResult::underflow(), ..FrameResult::default() });
                    }
                    self.payload_len = if self.extra_len_bytes == 2 {
                        input.get_u16() as u64
                    } else {
                        input.get_u64()
                    };
                    if self.opcode.is_control() && self.payload_len > 125 {
                        return Ok(self.synth_close_now(1002));
                    }
                    self.state = if self.expect_masked { State::ReadingMask } else {
                        self.begin_payload(out)?;
                        State::ReadingPayload
                    };
                }
                State::ReadingMask => {
                    if input.len() < 4 {
                        return Ok(FrameResult { codec: CodecResult::underflow(), ..FrameResult::default() });
                    }
                    self.mask_key.copy_from_slice(&input[..4]);
                    input.advance(4);
                    self.begin_payload(out)?;
                    self.state = State::ReadingPayload;
                }
                State::ReadingPayload => {
                    if let Some(max) = self.frame_size_limit() {
                        if self.payload_len > max as u64 {
                            return Ok(self.synth_close_now(1009));
                        }
                    }

                    let n = (self.remaining as usize).min(input.len()).min(out.capacity() - out.len());
                    if n > 0 {
                        let mut chunk = input.split_to(n);
                        if self.expect_masked {
                            mask::apply(&mut chunk, self.mask_key, self.mask_pos);
                        }
                        if self.opcode == OpCode::Text || self.fragment_opcode == Some(OpCode::Text) {
                            if self.utf8.push(&chunk).is_err() {
                                return Ok(self.synth_close_now(1007));
                            }
                        }
                        self.mask_pos += n;
                        out.extend_from_slice(&chunk);
                        self.remaining -= n as u64;
                    }

                    if self.remaining > 0 {
                        return Ok(FrameResult {
                            codec: if input.is_empty() { CodecResult::underflow() } else { CodecResult::overflow() },
                            ..FrameResult::default()
                        });
                    }

                    return self.finish_frame(out);
                }
            }
        }
    }

    fn frame_size_limit(&self) -> Option<usize> {
        if self.opcode.is_control() {
            None
        } else {
            Some(self.limits.max_ws_frame)
        }
    }

    /// `out` may already hold bytes from earlier frames the caller
    /// hasn't drained yet; record where this frame's own payload starts
    /// so [`Self::finish_frame`] only inspects its own bytes.
    fn begin_payload(&mut self, out: &BytesMut) -> Result<(), Error> {
        self.remaining = self.payload_len;
        self.mask_pos = 0;
        self.payload_start = out.len();
        Ok(())
    }

    fn finish_frame(&mut self, out: &mut BytesMut) -> Result<FrameResult, Error> {
        self.state = State::ReadingHead2;

        let is_text_message = self.opcode == OpCode::Text || self.fragment_opcode == Some(OpCode::Text);
        if self.fin && is_text_message && !self.utf8.at_boundary() {
            return Ok(self.synth_close_now(1007));
        }

        match self.opcode {
            OpCode::Text | OpCode::Binary => {
                self.fragment_opcode = if self.fin { None } else { Some(self.opcode) };
            }
            OpCode::Continuation if self.fin => self.fragment_opcode = None,
            _ => {}
        }

        let mut reply = None;
        let mut close_code = None;
        let mut response_only = false;
        let payload = &out[self.payload_start..];

        match self.opcode {
            OpCode::Ping => {
                reply = Some(AutoReply { opcode: OpCode::Pong, payload: BytesMut::from(payload) });
                response_only = true;
            }
            OpCode::Close => {
                if payload.len() == 1 {
                    return Ok(self.synth_close_now(1002));
                }
                if payload.len() >= 2 {
                    let code = u16::from_be_bytes([payload[0], payload[1]]);
                    if !close::is_valid_close_code(code) || std::str::from_utf8(&payload[2..]).is_err() {
                        return Ok(self.synth_close_now(1002));
                    }
                    close_code = Some(code);
                }
                let previous = self.closing.get();
                self.closing.set(previous.on_recv_close());
                if previous == ClosingState::Open {
                    reply = Some(AutoReply { opcode: OpCode::Close, payload: BytesMut::from(payload) });
                    response_only = true;
                }
            }
            _ => {}
        }

        Ok(FrameResult {
            codec: CodecResult { close_connection: self.closing.get() == ClosingState::Closed, ..CodecResult::default() },
            head: Some(FrameHead { fin: self.fin, opcode: self.opcode, close_code }),
            reply,
            response_only,
        })
    }

    fn synth_close_now(&mut self, code: u16) -> FrameResult {
        #[cfg(feature = "log")]
        crate::log::warning!("ws decoder closing with status {code}");
        self.state = State::ReadingHead2;
        self.closing.set(self.closing.get().on_send_close());
        let mut payload = BytesMut::with_capacity(2);
        payload.extend_from_slice(&code.to_be_bytes());
        FrameResult {
            codec: CodecResult { close_connection: true, ..CodecResult::default() },
            head: None,
            reply: Some(AutoReply { opcode: OpCode::Close, payload }),
            response_only: true,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn masked_frame(fin: bool, opcode: OpCode, payload: &[u8], mask_key: [u8; 4]) -> BytesMut {
        let mut out = BytesMut::new();
        out.extend_from_slice(&[(fin as u8) << 7 | opcode as u8, 0x80 | payload.len() as u8]);
        out.extend_from_slice(&mask_key);
        let mut masked = payload.to_vec();
        mask::apply(&mut masked, mask_key, 0);
        out.extend_from_slice(&masked);
        out
    }

    #[test]
    fn decodes_masked_text_frame() {
        let closing = close::new_shared();
        let mut decoder = Decoder::new(true, Limits::default(), closing);
        let mut input = masked_frame(true, OpCode::Text, b"hi", [1, 2, 3, 4]);
        let mut out = BytesMut::with_capacity(64);
        let result = decoder.decode(&mut input, &mut out).unwrap();
        let head = result.head.unwrap();
        assert!(head.fin);
        assert_eq!(head.opcode, OpCode::Text);
        assert_eq!(&out[..], b"hi");
    }

    #[test]
    fn rejects_unmasked_frame_on_server_side() {
        let closing = close::new_shared();
        let mut decoder = Decoder::new(true, Limits::default(), closing);
        let mut input = BytesMut::from(&[0x81u8, 0x02, b'h', b'i'][..]);
        let mut out = BytesMut::with_capacity(64);
        let result = decoder.decode(&mut input, &mut out).unwrap();
        assert!(result.codec.close_connection);
        assert!(result.reply.is_some());
    }

    #[test]
    fn ping_produces_pong_reply() {
        let closing = close::new_shared();
        let mut decoder = Decoder::new(true, Limits::default(), closing);
        let mut input = masked_frame(true, OpCode::Ping, b"ping-data", [9, 9, 9, 9]);
        let mut out = BytesMut::with_capacity(64);
        let result = decoder.decode(&mut input, &mut out).unwrap();
        let reply = result.reply.unwrap();
        assert_eq!(reply.opcode, OpCode::Pong);
        assert_eq!(&reply.payload[..], b"ping-data");
    }

    #[test]
    fn rejects_invalid_utf8_in_text_frame() {
        let closing = close::new_shared();
        let mut decoder = Decoder::new(true, Limits::default(), closing);
        let mut input = masked_frame(true, OpCode::Text, &[0xFF, 0xFE], [0, 0, 0, 0]);
        let mut out = BytesMut::with_capacity(64);
        let result = decoder.decode(&mut input, &mut out).unwrap();
        assert!(result.reply.is_some());
        assert!(result.codec.close_connection);
    }
}
