//! Streaming HTTP/1.1 encoder.
use bytes::{Buf, BufMut, BytesMut};

use crate::error::Error;
use crate::h1::chunked::ChunkedEncoder;
use crate::headers::{HeaderName, HeaderValue};
use crate::http::{Method, RequestHead, ResponseHead};
use crate::result::CodecResult;

/// Either half of a message start line the encoder can be asked to
/// write: a request (client role) or a response (server role).
#[derive(Debug)]
pub enum HeadOut {
    Request(RequestHead),
    Response(ResponseHead),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    None,
    Lengthed(u64),
    Chunked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    AwaitPayload,
    WritingBodyLengthed,
    WritingBodyChunked,
    Done,
}

/// A streaming encoder for one direction of an HTTP/1.1 connection.
#[derive(Debug)]
pub struct Encoder {
    state: State,
    framing: Framing,
    remaining: u64,
    chunked: ChunkedEncoder,
    close_connection: bool,
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            framing: Framing::None,
            remaining: 0,
            chunked: ChunkedEncoder::new(),
            close_connection: false,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// Serialize the start line and headers of `head` into `out`,
    /// deriving body framing from its headers (inserting
    /// `Transfer-Encoding: chunked` if neither it nor `Content-Length`
    /// is present and the message has a body).
    pub fn encode_header(&mut self, head: HeadOut, has_payload: bool, out: &mut BytesMut) -> Result<(), Error> {
        if self.state != State::Idle {
            return Err(Error::state("encode_header called before previous message finished"));
        }

        let (start_line, mut headers) = match head {
            HeadOut::Request(req) => {
                let line = format!("{} {} {}\r\n", req.method.as_str(), req.target, req.version.as_str());
                (line, req.headers)
            }
            HeadOut::Response(resp) => {
                let line = format!("{} {} {}\r\n", resp.version.as_str(), resp.status.as_u16(), resp.reason());
                (line, resp.headers)
            }
        };

        let content_length = headers
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let chunked = headers
            .get("transfer-encoding")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase().contains("chunked"))
            .unwrap_or(false);

        self.framing = if !has_payload {
            Framing::None
        } else if let Some(len) = content_length {
            Framing::Lengthed(len)
        } else if chunked {
            Framing::Chunked
        } else {
            headers.insert(HeaderName::from_static("transfer-encoding"), HeaderValue::from_static("chunked"));
            Framing::Chunked
        };

        self.close_connection = headers
            .get("connection")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase().contains("close"))
            .unwrap_or(false);

        out.put_slice(start_line.as_bytes());
        for (name, value) in headers.iter() {
            out.put_slice(name.as_str().as_bytes());
            out.put_slice(b": ");
            out.put_slice(value.as_bytes());
            out.put_slice(b"\r\n");
        }
        out.put_slice(b"\r\n");

        self.remaining = match self.framing {
            Framing::Lengthed(n) => n,
            _ => 0,
        };
        self.chunked = ChunkedEncoder::new();
        self.state = match self.framing {
            Framing::None => State::Done,
            Framing::Lengthed(0) => State::Done,
            Framing::Lengthed(_) => State::WritingBodyLengthed,
            Framing::Chunked => State::WritingBodyChunked,
        };
        Ok(())
    }

    /// Feed body bytes from `input`, writing encoded bytes to `out`.
    pub fn encode(
        &mut self,
        input: &mut dyn Buf,
        out: &mut BytesMut,
        end_of_input: bool,
    ) -> Result<CodecResult, Error> {
        match self.state {
            State::Idle => Err(Error::state("encode called before encode_header")),
            State::Done => {
                self.state = State::Idle;
                Ok(CodecResult { close_connection: self.close_connection, ..CodecResult::default() })
            }
            State::WritingBodyLengthed => {
                let n = (self.remaining as usize).min(input.remaining()).min(out.capacity() - out.len());
                if n > 0 {
                    out.put(input.take(n));
                    self.remaining -= n as u64;
                }
                if self.remaining == 0 {
                    self.state = State::Idle;
                    return Ok(CodecResult { close_connection: self.close_connection, ..CodecResult::default() });
                }
                Ok(if input.has_remaining() { CodecResult::overflow() } else { CodecResult::underflow() })
            }
            State::WritingBodyChunked => {
                let avail = out.capacity() - out.len();
                if avail < 16 {
                    return Ok(CodecResult::overflow());
                }
                let n = input.remaining().min(avail - 16);
                let mut chunk = vec![0u8; n];
                input.copy_to_slice(&mut chunk);
                self.chunked.encode_chunk(&chunk, end_of_input, out);
                if end_of_input {
                    self.state = State::Idle;
                    return Ok(CodecResult { close_connection: self.close_connection, ..CodecResult::default() });
                }
                Ok(if input.has_remaining() { CodecResult::overflow() } else { CodecResult::underflow() })
            }
            State::AwaitPayload => unreachable!("AwaitPayload is folded into the framing-specific states"),
        }
    }

    /// Finalize a response declared with no body (`has_payload=false`):
    /// nothing further to write, just surfaces `close_connection`.
    pub fn encode_flush(&mut self, _out: &mut BytesMut) -> Result<CodecResult, Error> {
        match self.state {
            State::Done => {
                self.state = State::Idle;
                Ok(CodecResult { close_connection: self.close_connection, ..CodecResult::default() })
            }
            State::Idle => Ok(CodecResult::default()),
            _ => Err(Error::state("encode_flush called with an outstanding body")),
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::headers::HeaderMap;
    use crate::http::{RequestHead, StatusCode, Version};

    fn response_head(content_length: Option<u64>) -> ResponseHead {
        let mut head = ResponseHead::new(StatusCode::OK, Method::GET);
        head.version = Version::HTTP_11;
        if let Some(len) = content_length {
            head.headers.insert(
                HeaderName::from_static("content-length"),
                HeaderValue::try_from_string(len.to_string()).unwrap(),
            );
        }
        head
    }

    #[test]
    fn encodes_lengthed_response() {
        let mut encoder = Encoder::new();
        let mut out = BytesMut::with_capacity(256);
        encoder.encode_header(HeadOut::Response(response_head(Some(13))), true, &mut out).unwrap();
        let mut body: &[u8] = b"Hello, world!";
        let result = encoder.encode(&mut body, &mut out, true).unwrap();
        assert!(!result.underflow);
        let text = String::from_utf8(out.to_vec()).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("Hello, world!"));
    }

    #[test]
    fn inserts_chunked_when_length_unknown() {
        let mut encoder = Encoder::new();
        let mut out = BytesMut::with_capacity(256);
        encoder.encode_header(HeadOut::Response(response_head(None)), true, &mut out).unwrap();
        let mut body: &[u8] = b"Hello, world!";
        encoder.encode(&mut body, &mut out, true).unwrap();
        let text = String::from_utf8(out.to_vec()).unwrap();
        assert!(text.contains("transfer-encoding: chunked"));
        assert!(text.ends_with("d\r\nHello, world!\r\n0\r\n\r\n"));
    }

    #[test]
    fn no_body_response_finishes_on_flush() {
        let mut encoder = Encoder::new();
        let mut out = BytesMut::with_capacity(256);
        let mut head = ResponseHead::new(StatusCode::NO_CONTENT, Method::GET);
        head.version = Version::HTTP_11;
        encoder.encode_header(HeadOut::Response(head), false, &mut out).unwrap();
        let result = encoder.encode_flush(&mut out).unwrap();
        assert!(!result.underflow && !result.overflow);
    }

    #[test]
    fn encodes_request_start_line() {
        let mut encoder = Encoder::new();
        let mut out = BytesMut::with_capacity(256);
        let req = RequestHead {
            method: Method::GET,
            target: "/hello".to_string(),
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
        };
        encoder.encode_header(HeadOut::Request(req), false, &mut out).unwrap();
        encoder.encode_flush(&mut out).unwrap();
        let text = String::from_utf8(out.to_vec()).unwrap();
        assert!(text.starts_with("GET /hello HTTP/1.1\r\n"));
    }
}
