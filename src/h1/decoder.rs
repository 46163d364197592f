//! Streaming HTTP/1.1 decoder.
use bytes::{Buf, BytesMut};

use crate::buf;
use crate::error::Error;
use crate::h1::chunked::{ChunkedDecoder, ChunkedEvent};
use crate::h1::limits::Limits;
use crate::headers::{HeaderMap, HeaderName, HeaderValue};
use crate::http::{Method, RequestHead, ResponseHead, StatusCode, Version};
use crate::result::{CodecResult, DecoderResult};

/// Which side of the connection this decoder parses messages for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Parses request start lines/headers.
    Server,
    /// Parses response start lines/headers. Needs to know the method of
    /// the request each response answers, via [`Decoder::note_request`],
    /// since that governs whether the response carries a body.
    Client,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitStartLine,
    ReadingHeaders,
    ReadingBodyLengthed,
    ReadingBodyChunked,
    ReadingBodyUntilClose,
    Complete,
}

#[derive(Debug, Default)]
struct PartialHead {
    method: Option<Method>,
    target: Option<String>,
    status: Option<StatusCode>,
    reason: Option<String>,
    version: Version,
    headers: HeaderMap,
}

/// The fully decoded start line and headers of one message.
#[derive(Debug)]
pub enum DecodedHead {
    Request(RequestHead),
    Response(ResponseHead),
}

/// A streaming decoder for one direction of an HTTP/1.1 connection.
///
/// Owns no socket; callers feed bytes via [`Decoder::decode`] as they
/// arrive and drain produced body bytes from `out`.
#[derive(Debug)]
pub struct Decoder {
    role: Role,
    limits: Limits,
    state: State,
    partial: PartialHead,
    header_count: usize,
    remaining_length: u64,
    chunked: ChunkedDecoder,
    pending_request_method: Method,
    requested_upgrade: Option<String>,
    connection_close: bool,
}

impl Decoder {
    pub fn new(role: Role, limits: Limits) -> Self {
        Self {
            role,
            limits,
            state: State::AwaitStartLine,
            partial: PartialHead::default(),
            header_count: 0,
            remaining_length: 0,
            chunked: ChunkedDecoder::new(),
            pending_request_method: Method::GET,
            requested_upgrade: None,
            connection_close: false,
        }
    }

    /// For [`Role::Client`] decoders: tell the decoder which method the
    /// next response answers, since `HEAD` responses never carry a body.
    pub fn note_request(&mut self, method: Method) {
        self.pending_request_method = method;
    }

    /// The `Upgrade:` token of the just-completed request, if it also
    /// carried `Connection: upgrade`. Cleared once a new message starts.
    pub fn requested_upgrade(&self) -> Option<&str> {
        self.requested_upgrade.as_deref()
    }

    pub fn decode(
        &mut self,
        input: &mut BytesMut,
        out: &mut BytesMut,
        end_of_input: bool,
    ) -> Result<DecoderResult, Error> {
        loop {
            match self.state {
                State::Complete => {
                    self.reset_for_next_message();
                    continue;
                }
                State::AwaitStartLine => match buf::find_line_end(input) {
                    None => {
                        if input.len() > self.limits.max_start_line {
                            return Ok(self.synth_error(StatusCode::URI_TOO_LONG));
                        }
                        if end_of_input {
                            return self.incomplete_at_eof();
                        }
                        return Ok(DecoderResult::from_codec(CodecResult::underflow()));
                    }
                    Some((idx, len)) => {
                        if idx > self.limits.max_start_line {
                            return Ok(self.synth_error(StatusCode::URI_TOO_LONG));
                        }
                        let line = input.split_to(idx + len);
                        let line = &line[..idx];
                        match self.parse_start_line(line) {
                            Ok(()) => self.state = State::ReadingHeaders,
                            Err(status) => return Ok(self.synth_error(status)),
                        }
                    }
                },
                State::ReadingHeaders => match buf::find_line_end(input) {
                    None => {
                        if input.len() > self.limits.max_header_line {
                            return Ok(self.synth_error(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE));
                        }
                        if end_of_input {
                            return self.incomplete_at_eof();
                        }
                        return Ok(DecoderResult::from_codec(CodecResult::underflow()));
                    }
                    Some((idx, len)) => {
                        if idx > self.limits.max_header_line {
                            return Ok(self.synth_error(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE));
                        }
                        if idx == 0 {
                            input.advance(len);
                            return self.finish_headers();
                        }
                        let line = input.split_to(idx + len);
                        let line = &line[..idx];
                        if matches!(line.first(), Some(b' ') | Some(b'\t')) {
                            // obsolete line folding: append to the previous value
                            if let Some((_, last)) = self.partial.headers.iter().last() {
                                let mut value = last.as_bytes().to_vec();
                                value.push(b' ');
                                value.extend_from_slice(crate::fields::trim(line));
                                if let Ok(v) = HeaderValue::try_from_bytes(value.into()) {
                                    self.partial.headers.replace_last_value(v);
                                }
                            }
                            continue;
                        }
                        self.header_count += 1;
                        if self.header_count > self.limits.max_header_count {
                            return Ok(self.synth_error(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE));
                        }
                        match parse_header_line(line) {
                            Some((name, value)) => self.partial.headers.append(name, value),
                            None => return Ok(self.synth_error(StatusCode::BAD_REQUEST)),
                        }
                    }
                },
                State::ReadingBodyLengthed => {
                    let n = (self.remaining_length as usize)
                        .min(input.len())
                        .min(out.capacity() - out.len());
                    if n > 0 {
                        out.extend_from_slice(&input[..n]);
                        input.advance(n);
                        self.remaining_length -= n as u64;
                    }
                    if self.remaining_length == 0 {
                        self.state = State::Complete;
                        return Ok(DecoderResult::from_codec(CodecResult {
                            close_connection: self.connection_close,
                            ..CodecResult::default()
                        }));
                    }
                    if end_of_input && input.is_empty() {
                        return self.incomplete_at_eof();
                    }
                    return Ok(DecoderResult::from_codec(if input.is_empty() {
                        CodecResult::underflow()
                    } else {
                        CodecResult::overflow()
                    }));
                }
                State::ReadingBodyChunked => {
                    let mut slice: &[u8] = input;
                    let event = self.chunked.decode(&mut slice, out)?;
                    let consumed = input.len() - slice.len();
                    input.advance(consumed);
                    match event {
                        ChunkedEvent::Complete => {
                            self.state = State::Complete;
                            return Ok(DecoderResult::from_codec(CodecResult {
                                close_connection: self.connection_close,
                                ..CodecResult::default()
                            }));
                        }
                        ChunkedEvent::NeedMoreInput => {
                            if end_of_input {
                                return self.incomplete_at_eof();
                            }
                            return Ok(DecoderResult::from_codec(CodecResult::underflow()));
                        }
                        ChunkedEvent::OutputFull => {
                            return Ok(DecoderResult::from_codec(CodecResult::overflow()));
                        }
                    }
                }
                State::ReadingBodyUntilClose => {
                    let n = input.len().min(out.capacity() - out.len());
                    if n > 0 {
                        out.extend_from_slice(&input[..n]);
                        input.advance(n);
                    }
                    if end_of_input && input.is_empty() {
                        self.state = State::Complete;
                        return Ok(DecoderResult::from_codec(CodecResult {
                            close_connection: true,
                            ..CodecResult::default()
                        }));
                    }
                    return Ok(DecoderResult::from_codec(if input.is_empty() {
                        CodecResult::underflow()
                    } else {
                        CodecResult::overflow()
                    }));
                }
            }
        }
    }

    fn parse_start_line(&mut self, line: &[u8]) -> Result<(), StatusCode> {
        match self.role {
            Role::Server => {
                let (method_bytes, rest) = buf::split_at_space(line).ok_or(StatusCode::BAD_REQUEST)?;
                let method = Method::from_bytes(method_bytes).ok_or(StatusCode::METHOD_NOT_ALLOWED)?;
                let (target, version) =
                    buf::split_at_space(rest).ok_or(StatusCode::BAD_REQUEST)?;
                let version = Version::parse(version).map_err(|_| StatusCode::BAD_REQUEST)?;
                if version.major() != 1 {
                    return Err(StatusCode::HTTP_VERSION_NOT_SUPPORTED);
                }
                self.partial.method = Some(method);
                self.partial.target =
                    Some(std::str::from_utf8(target).map_err(|_| StatusCode::BAD_REQUEST)?.to_string());
                self.partial.version = version;
                Ok(())
            }
            Role::Client => {
                let (version, rest) = buf::split_at_space(line).ok_or(StatusCode::BAD_REQUEST)?;
                let version = Version::parse(version).map_err(|_| StatusCode::BAD_REQUEST)?;
                let (status, reason) = buf::split_at_space(rest).ok_or(StatusCode::BAD_REQUEST)?;
                let status_code: u16 =
                    std::str::from_utf8(status).ok().and_then(|s| s.parse().ok()).ok_or(StatusCode::BAD_REQUEST)?;
                let status = StatusCode::from_u16(status_code).map_err(|_| StatusCode::BAD_REQUEST)?;
                self.partial.version = version;
                self.partial.status = Some(status);
                self.partial.reason =
                    Some(String::from_utf8_lossy(crate::fields::trim(reason)).into_owned());
                Ok(())
            }
        }
    }

    fn finish_headers(&mut self) -> Result<DecoderResult, Error> {
        let connection = self.partial.headers.get("connection").and_then(|v| v.to_str().ok().map(str::to_string));
        let connection_tokens = connection.as_deref().map(|s| s.to_ascii_lowercase()).unwrap_or_default();
        self.connection_close = connection_tokens.contains("close")
            || (self.partial.version == Version::HTTP_10 && !connection_tokens.contains("keep-alive"));

        if self.role == Role::Server {
            if connection_tokens.contains("upgrade") {
                if let Some(proto) = self.partial.headers.get("upgrade").and_then(|v| v.to_str().ok()) {
                    self.requested_upgrade = Some(proto.to_string());
                }
            } else {
                self.requested_upgrade = None;
            }
        }

        let transfer_encoding_chunked = self
            .partial
            .headers
            .get("transfer-encoding")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase().contains("chunked"))
            .unwrap_or(false);
        let content_length = self.partial.headers.get("content-length").and_then(|v| v.to_str().ok()).map(str::to_string);

        let no_body = match self.role {
            Role::Server => false,
            Role::Client => {
                let status = self.partial.status.unwrap_or(StatusCode::OK);
                status.is_informational()
                    || status == StatusCode::NO_CONTENT
                    || status == StatusCode::NOT_MODIFIED
                    || self.pending_request_method == Method::HEAD
            }
        };

        if no_body {
            self.state = State::Complete;
        } else if transfer_encoding_chunked {
            self.chunked = ChunkedDecoder::new();
            self.state = State::ReadingBodyChunked;
        } else if let Some(len) = content_length {
            let len: u64 = match len.trim().parse() {
                Ok(n) => n,
                Err(_) => return Ok(self.synth_error(StatusCode::BAD_REQUEST)),
            };
            self.remaining_length = len;
            self.state = if len == 0 { State::Complete } else { State::ReadingBodyLengthed };
        } else {
            match self.role {
                Role::Server => {
                    self.remaining_length = 0;
                    self.state = State::Complete;
                }
                Role::Client => self.state = State::ReadingBodyUntilClose,
            }
        }

        let mut result = DecoderResult::from_codec(CodecResult {
            close_connection: self.connection_close && self.state == State::Complete,
            ..CodecResult::default()
        });
        result.header_completed = true;

        if self.role == Role::Server {
            let expect_continue = self
                .partial
                .headers
                .get("expect")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.eq_ignore_ascii_case("100-continue"))
                .unwrap_or(false);
            if expect_continue {
                let method = self.partial.method.unwrap_or(Method::GET);
                result.response = Some(ResponseHead::new(StatusCode::CONTINUE, method));
                result.response_only = false;
            }
        }

        Ok(result)
    }

    /// The peer closed the connection with an incomplete message in
    /// flight: a synthetic 400 for a server decoder, since nothing valid
    /// can be sent back otherwise, and an error for a client decoder
    /// since there is no response to hand back to its caller.
    fn incomplete_at_eof(&mut self) -> Result<DecoderResult, Error> {
        match self.role {
            Role::Server => Ok(self.synth_error(StatusCode::BAD_REQUEST)),
            Role::Client => Err(Error::protocol("connection closed before the response completed")),
        }
    }

    fn synth_error(&mut self, status: StatusCode) -> DecoderResult {
        #[cfg(feature = "log")]
        crate::log::warning!("h1 decoder synthesized {} in state {:?}", status.as_u16(), self.state);
        let method = self.partial.method.unwrap_or(Method::GET);
        self.state = State::Complete;
        DecoderResult {
            codec: CodecResult { close_connection: true, ..CodecResult::default() },
            header_completed: true,
            response: Some(ResponseHead::new(status, method)),
            response_only: true,
        }
    }

    /// Take the completed message head. Valid once `header_completed` was
    /// reported and before the next message starts.
    pub fn take_head(&mut self) -> DecodedHead {
        match self.role {
            Role::Server => DecodedHead::Request(RequestHead {
                method: self.partial.method.take().unwrap_or(Method::GET),
                target: self.partial.target.take().unwrap_or_default(),
                version: self.partial.version,
                headers: std::mem::take(&mut self.partial.headers),
            }),
            Role::Client => DecodedHead::Response(ResponseHead {
                version: self.partial.version,
                status: self.partial.status.take().unwrap_or(StatusCode::OK),
                reason: self.partial.reason.take(),
                headers: std::mem::take(&mut self.partial.headers),
                request_method: self.pending_request_method,
            }),
        }
    }

    fn reset_for_next_message(&mut self) {
        self.state = State::AwaitStartLine;
        self.partial = PartialHead::default();
        self.header_count = 0;
    }
}

fn parse_header_line(line: &[u8]) -> Option<(HeaderName, HeaderValue)> {
    let colon = line.iter().position(|&b| b == b':')?;
    let name = HeaderName::new(&line[..colon]).ok()?;
    let value = crate::fields::trim(&line[colon + 1..]);
    let value = HeaderValue::try_copy_from_slice(value).ok()?;
    Some((name, value))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decodes_simple_get_request() {
        let mut decoder = Decoder::new(Role::Server, Limits::default());
        let mut input = BytesMut::from(&b"GET /hello HTTP/1.1\r\nHost: x\r\n\r\n"[..]);
        let mut out = BytesMut::with_capacity(64);
        let result = decoder.decode(&mut input, &mut out, false).unwrap();
        assert!(result.header_completed);
        assert!(result.response.is_none());
        let DecodedHead::Request(req) = decoder.take_head() else { panic!("expected request") };
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.target, "/hello");
        assert_eq!(req.version, Version::HTTP_11);
        assert_eq!(req.headers.get("host").unwrap().to_str().unwrap(), "x");
    }

    #[test]
    fn splits_header_line_across_calls() {
        let mut decoder = Decoder::new(Role::Server, Limits::default());
        let mut input = BytesMut::from(&b"GET / HTTP/1.1\r\nHost: exa"[..]);
        let mut out = BytesMut::with_capacity(64);
        let result = decoder.decode(&mut input, &mut out, false).unwrap();
        assert!(result.codec.underflow);
        input.extend_from_slice(b"mple.com\r\n\r\n");
        let result = decoder.decode(&mut input, &mut out, false).unwrap();
        assert!(result.header_completed);
        let DecodedHead::Request(req) = decoder.take_head() else { panic!("expected request") };
        assert_eq!(req.headers.get("host").unwrap().to_str().unwrap(), "example.com");
    }

    #[test]
    fn surfaces_expect_continue() {
        let mut decoder = Decoder::new(Role::Server, Limits::default());
        let mut input =
            BytesMut::from(&b"POST /up HTTP/1.1\r\nHost: x\r\nContent-Length: 4\r\nExpect: 100-continue\r\n\r\n"[..]);
        let mut out = BytesMut::with_capacity(64);
        let result = decoder.decode(&mut input, &mut out, false).unwrap();
        assert!(result.header_completed);
        assert_eq!(result.response.unwrap().status, StatusCode::CONTINUE);
        assert!(!result.response_only);
    }

    #[test]
    fn decodes_chunked_body() {
        let mut decoder = Decoder::new(Role::Server, Limits::default());
        let mut input = BytesMut::from(
            &b"POST /x HTTP/1.1\r\nHost: x\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n0\r\n\r\n"[..],
        );
        let mut out = BytesMut::with_capacity(64);
        let result = decoder.decode(&mut input, &mut out, false).unwrap();
        assert!(result.header_completed);
        assert_eq!(&out[..], b"Wiki");
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut decoder = Decoder::new(Role::Server, Limits::default());
        let mut input = BytesMut::from(&b"GET / HTTP/2.0\r\n\r\n"[..]);
        let mut out = BytesMut::with_capacity(64);
        let result = decoder.decode(&mut input, &mut out, false).unwrap();
        assert_eq!(result.response.unwrap().status, StatusCode::HTTP_VERSION_NOT_SUPPORTED);
        assert!(result.response_only);
        assert!(result.codec.close_connection);
    }

    #[test]
    fn server_synthesizes_bad_request_on_truncated_connection() {
        let mut decoder = Decoder::new(Role::Server, Limits::default());
        let mut input = BytesMut::from(&b"GET /hello HTTP/1.1\r\nHost: x"[..]);
        let mut out = BytesMut::with_capacity(64);
        let result = decoder.decode(&mut input, &mut out, true).unwrap();
        assert_eq!(result.response.unwrap().status, StatusCode::BAD_REQUEST);
        assert!(result.response_only);
        assert!(result.codec.close_connection);
    }

    #[test]
    fn client_errors_on_truncated_connection() {
        let mut decoder = Decoder::new(Role::Client, Limits::default());
        let mut input = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Length: 10"[..]);
        let mut out = BytesMut::with_capacity(64);
        assert!(decoder.decode(&mut input, &mut out, true).is_err());
    }

    #[test]
    fn client_errors_on_truncated_lengthed_body() {
        let mut decoder = Decoder::new(Role::Client, Limits::default());
        let mut input = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nhi"[..]);
        let mut out = BytesMut::with_capacity(64);
        assert!(decoder.decode(&mut input, &mut out, true).is_err());
    }

    #[test]
    fn head_response_has_no_body() {
        let mut decoder = Decoder::new(Role::Client, Limits::default());
        decoder.note_request(Method::HEAD);
        let mut input =
            BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n"[..]);
        let mut out = BytesMut::with_capacity(64);
        let result = decoder.decode(&mut input, &mut out, false).unwrap();
        assert!(result.header_completed);
        assert!(out.is_empty());
    }
}
