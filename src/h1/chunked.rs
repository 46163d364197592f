//! Chunked transfer-coding, RFC 9112 §7.1.
use bytes::{BufMut, BytesMut};

use crate::buf;
use crate::error::Error;

/// What a single [`ChunkedDecoder::decode`] call accomplished.
#[derive(Debug, PartialEq, Eq)]
pub enum ChunkedEvent {
    /// The chunked body (including the trailer's empty line) is fully
    /// consumed.
    Complete,
    /// `input` was exhausted before a full chunk/trailer line arrived.
    NeedMoreInput,
    /// `out` ran out of room for chunk data.
    OutputFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ChunkHeader,
    ChunkData,
    ChunkDataCrlf,
    TrailerLine,
    Done,
}

/// Decodes a chunked body into raw payload bytes, discarding chunk
/// extensions and trailer fields.
#[derive(Debug)]
pub struct ChunkedDecoder {
    state: State,
    remaining: u64,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: State::ChunkHeader, remaining: 0 }
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    pub fn decode(&mut self, input: &mut &[u8], out: &mut BytesMut) -> Result<ChunkedEvent, Error> {
        loop {
            match self.state {
                State::Done => return Ok(ChunkedEvent::Complete),
                State::ChunkHeader => {
                    let Some((idx, len)) = buf::find_line_end(input) else {
                        return Ok(ChunkedEvent::NeedMoreInput);
                    };
                    let line = &input[..idx];
                    let size_field = line.split(|&b| b == b';').next().unwrap_or(line);
                    let size = parse_hex_size(size_field)?;
                    *input = &input[idx + len..];
                    if size == 0 {
                        self.state = State::TrailerLine;
                    } else {
                        self.remaining = size;
                        self.state = State::ChunkData;
                    }
                }
                State::ChunkData => {
                    let avail_out = out.capacity() - out.len();
                    let n = (self.remaining as usize).min(input.len()).min(avail_out);
                    if n > 0 {
                        out.put_slice(&input[..n]);
                        *input = &input[n..];
                        self.remaining -= n as u64;
                    }
                    if self.remaining > 0 {
                        return Ok(if input.is_empty() {
                            ChunkedEvent::NeedMoreInput
                        } else {
                            ChunkedEvent::OutputFull
                        });
                    }
                    self.state = State::ChunkDataCrlf;
                }
                State::ChunkDataCrlf => {
                    let Some((idx, len)) = buf::find_line_end(input) else {
                        return Ok(ChunkedEvent::NeedMoreInput);
                    };
                    if idx != 0 {
                        return Err(Error::parse("expected CRLF after chunk data", 0));
                    }
                    *input = &input[idx + len..];
                    self.state = State::ChunkHeader;
                }
                State::TrailerLine => {
                    let Some((idx, len)) = buf::find_line_end(input) else {
                        return Ok(ChunkedEvent::NeedMoreInput);
                    };
                    *input = &input[idx + len..];
                    if idx == 0 {
                        self.state = State::Done;
                        return Ok(ChunkedEvent::Complete);
                    }
                    // trailer field lines are otherwise ignored: the
                    // spec only requires skipping them.
                }
            }
        }
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_hex_size(field: &[u8]) -> Result<u64, Error> {
    let field = crate::fields::trim(field);
    if field.is_empty() {
        return Err(Error::parse("empty chunk size", 0));
    }
    let mut value: u64 = 0;
    for &b in field {
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => return Err(Error::parse("invalid chunk size digit", 0)),
        };
        value = value.checked_mul(16).and_then(|v| v.checked_add(digit as u64))
            .ok_or_else(|| Error::parse("chunk size overflow", 0))?;
    }
    Ok(value)
}

/// Encodes raw payload bytes as chunked transfer-coding.
#[derive(Debug, Default)]
pub struct ChunkedEncoder {
    finished: bool,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self { finished: false }
    }

    /// Encode one chunk wrapping `data` (may be empty only when
    /// `end_of_input` is also true, to emit the terminator).
    pub fn encode_chunk(&mut self, data: &[u8], end_of_input: bool, out: &mut BytesMut) {
        if !data.is_empty() {
            out.put_slice(format!("{:x}\r\n", data.len()).as_bytes());
            out.put_slice(data);
            out.put_slice(b"\r\n");
        }
        if end_of_input && !self.finished {
            out.put_slice(b"0\r\n\r\n");
            self.finished = true;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decodes_single_chunk_and_terminator() {
        let mut decoder = ChunkedDecoder::new();
        let mut input: &[u8] = b"5\r\nHello\r\n0\r\n\r\n";
        let mut out = BytesMut::with_capacity(32);
        let event = decoder.decode(&mut input, &mut out).unwrap();
        assert_eq!(event, ChunkedEvent::Complete);
        assert_eq!(&out[..], b"Hello");
    }

    #[test]
    fn decodes_across_multiple_chunks() {
        let mut decoder = ChunkedDecoder::new();
        let mut input: &[u8] = b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
        let mut out = BytesMut::with_capacity(32);
        let event = decoder.decode(&mut input, &mut out).unwrap();
        assert_eq!(event, ChunkedEvent::Complete);
        assert_eq!(&out[..], b"Wikipedia");
    }

    #[test]
    fn reports_need_more_input_on_split_header() {
        let mut decoder = ChunkedDecoder::new();
        let mut input: &[u8] = b"5\r\nHel";
        let mut out = BytesMut::with_capacity(32);
        let event = decoder.decode(&mut input, &mut out).unwrap();
        assert_eq!(event, ChunkedEvent::NeedMoreInput);
        assert_eq!(&out[..], b"Hel");
    }

    #[test]
    fn rejects_invalid_chunk_size() {
        let mut decoder = ChunkedDecoder::new();
        let mut input: &[u8] = b"zz\r\n";
        let mut out = BytesMut::with_capacity(32);
        assert!(decoder.decode(&mut input, &mut out).is_err());
    }

    #[test]
    fn encoder_round_trips_through_decoder() {
        let mut encoder = ChunkedEncoder::new();
        let mut out = BytesMut::with_capacity(64);
        encoder.encode_chunk(b"Hello, world!", true, &mut out);

        let mut decoder = ChunkedDecoder::new();
        let mut input: &[u8] = &out;
        let mut decoded = BytesMut::with_capacity(64);
        let event = decoder.decode(&mut input, &mut decoded).unwrap();
        assert_eq!(event, ChunkedEvent::Complete);
        assert_eq!(&decoded[..], b"Hello, world!");
    }
}
