//! Streaming WebSocket frame encoder, RFC 6455 §5.2-§5.3.
use bytes::{Buf, BufMut, BytesMut};
use rand::RngCore;

use crate::error::Error;
use crate::result::CodecResult;
use crate::ws::close::{ClosingState, SharedClosingState};
use crate::ws::frame::OpCode;
use crate::ws::mask;

const MAX_HEADER_LEN: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    WritingHeader,
    WritingPayload,
}

/// A streaming encoder for one direction of a WebSocket connection.
///
/// `mask_outgoing` must be `true` for a client encoding frames to send to
/// a server, and `false` for a server encoding frames to send to a
/// client, per the masking requirement in RFC 6455 §5.1.
#[derive(Debug)]
pub struct Encoder {
    mask_outgoing: bool,
    state: State,
    header: [u8; MAX_HEADER_LEN],
    header_len: usize,
    header_pos: usize,
    mask_key: [u8; 4],
    remaining: u64,
    mask_pos: usize,
    close_connection: bool,
    closing: SharedClosingState,
}

impl Encoder {
    pub fn new(mask_outgoing: bool, closing: SharedClosingState) -> Self {
        Self {
            mask_outgoing,
            state: State::Idle,
            header: [0; MAX_HEADER_LEN],
            header_len: 0,
            header_pos: 0,
            mask_key: [0; 4],
            remaining: 0,
            mask_pos: 0,
            close_connection: false,
            closing,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// Begin a frame: `fin` marks the last fragment of a message (or the
    /// only frame of an unfragmented one); `payload_len` must be the
    /// exact byte count [`Self::encode`] will be fed before the frame is
    /// complete, since WebSocket framing has no chunked-equivalent.
    pub fn encode_header(
        &mut self,
        opcode: OpCode,
        fin: bool,
        payload_len: u64,
        out: &mut BytesMut,
    ) -> Result<(), Error> {
        if self.state != State::Idle {
            return Err(Error::state("encode_header called before previous frame finished"));
        }
        if opcode.is_control() && payload_len > 125 {
            return Err(Error::protocol("control frame payload exceeds 125 bytes"));
        }

        self.header[0] = (fin as u8) << 7 | opcode as u8;
        let mut len = 2;
        match payload_len {
            n if n < 126 => self.header[1] = n as u8,
            n if n <= u16::MAX as u64 => {
                self.header[1] = 126;
                self.header[2..4].copy_from_slice(&(n as u16).to_be_bytes());
                len += 2;
            }
            n => {
                self.header[1] = 127;
                self.header[2..10].copy_from_slice(&n.to_be_bytes());
                len += 8;
            }
        }

        if self.mask_outgoing {
            self.header[1] |= 0x80;
            rand::thread_rng().fill_bytes(&mut self.mask_key);
            self.header[len..len + 4].copy_from_slice(&self.mask_key);
            len += 4;
        }

        self.header_len = len;
        self.header_pos = 0;
        self.remaining = payload_len;
        self.mask_pos = 0;
        // sending a close frame advances the shared handshake state the same
        // way the decoder does on receipt; close_connection only reports
        // true once both sides have reached CLOSED.
        self.close_connection = if opcode == OpCode::Close {
            self.closing.set(self.closing.get().on_send_close());
            self.closing.get() == ClosingState::Closed
        } else {
            false
        };
        self.state = State::WritingHeader;
        self.write_header(out);
        Ok(())
    }

    fn write_header(&mut self, out: &mut BytesMut) {
        let n = (self.header_len - self.header_pos).min(out.capacity() - out.len());
        out.put_slice(&self.header[self.header_pos..self.header_pos + n]);
        self.header_pos += n;
        if self.header_pos == self.header_len {
            self.state = if self.remaining == 0 { State::Idle } else { State::WritingPayload };
        }
    }

    /// Feed payload bytes from `input`, masking them if this encoder
    /// speaks the client role.
    pub fn encode(&mut self, input: &mut dyn Buf, out: &mut BytesMut) -> Result<CodecResult, Error> {
        match self.state {
            State::Idle => Ok(CodecResult { close_connection: self.close_connection, ..CodecResult::default() }),
            State::WritingHeader => {
                self.write_header(out);
                Ok(CodecResult::overflow())
            }
            State::WritingPayload => {
                let n = (self.remaining as usize).min(input.remaining()).min(out.capacity() - out.len());
                if n > 0 {
                    let start = out.len();
                    out.put(input.take(n));
                    if self.mask_outgoing {
                        mask::apply(&mut out[start..start + n], self.mask_key, self.mask_pos);
                    }
                    self.mask_pos += n;
                    self.remaining -= n as u64;
                }
                if self.remaining == 0 {
                    self.state = State::Idle;
                    return Ok(CodecResult { close_connection: self.close_connection, ..CodecResult::default() });
                }
                Ok(if input.has_remaining() { CodecResult::overflow() } else { CodecResult::underflow() })
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ws::close;

    #[test]
    fn encodes_unmasked_text_frame() {
        let mut encoder = Encoder::new(false, close::new_shared());
        let mut out = BytesMut::with_capacity(64);
        encoder.encode_header(OpCode::Text, true, 5, &mut out).unwrap();
        let mut payload: &[u8] = b"hello";
        let result = encoder.encode(&mut payload, &mut out).unwrap();
        assert!(!result.overflow && !result.underflow);
        assert_eq!(&out[..], &[0x81, 0x05, b'h', b'e', b'l', b'l', b'o']);
    }

    #[test]
    fn masks_client_frame_and_is_reversible() {
        let mut encoder = Encoder::new(true, close::new_shared());
        let mut out = BytesMut::with_capacity(64);
        encoder.encode_header(OpCode::Binary, true, 4, &mut out).unwrap();
        let mut payload: &[u8] = b"data";
        encoder.encode(&mut payload, &mut out).unwrap();
        assert_eq!(out[0], 0x82);
        assert_eq!(out[1] & 0x80, 0x80);
        let mask_key = [out[2], out[3], out[4], out[5]];
        let mut body = out[6..].to_vec();
        mask::apply(&mut body, mask_key, 0);
        assert_eq!(body, b"data");
    }

    #[test]
    fn rejects_oversized_control_payload() {
        let mut encoder = Encoder::new(false, close::new_shared());
        let mut out = BytesMut::with_capacity(64);
        assert!(encoder.encode_header(OpCode::Ping, true, 200, &mut out).is_err());
    }

    #[test]
    fn uses_two_byte_extended_length_for_medium_payloads() {
        let mut encoder = Encoder::new(false, close::new_shared());
        let mut out = BytesMut::with_capacity(70_000);
        encoder.encode_header(OpCode::Binary, true, 200, &mut out).unwrap();
        assert_eq!(out[1], 126);
        assert_eq!(u16::from_be_bytes([out[2], out[3]]), 200);
    }

    #[test]
    fn initiating_close_waits_for_peer_before_reporting_closed() {
        let closing = close::new_shared();
        let mut encoder = Encoder::new(false, closing.clone());
        let mut out = BytesMut::with_capacity(64);
        encoder.encode_header(OpCode::Close, true, 0, &mut out).unwrap();
        let result = encoder.encode(&mut (&[][..]), &mut out).unwrap();
        assert!(!result.close_connection);
        assert_eq!(closing.get(), ClosingState::CloseSent);
    }

    #[test]
    fn echoing_peers_close_reaches_closed() {
        let closing = close::new_shared();
        closing.set(ClosingState::CloseReceived);
        let mut encoder = Encoder::new(false, closing.clone());
        let mut out = BytesMut::with_capacity(64);
        encoder.encode_header(OpCode::Close, true, 0, &mut out).unwrap();
        let result = encoder.encode(&mut (&[][..]), &mut out).unwrap();
        assert!(result.close_connection);
        assert_eq!(closing.get(), ClosingState::Closed);
    }
}
