//! Server-side connection engine: request decoder + response encoder,
//! swapping to an upgraded protocol after a successful `101` exchange.
use bytes::{Buf, BytesMut};

use crate::error::Error;
use crate::fields::Instant;
use crate::h1::{self, DecodedHead, HeadOut, Limits, Role};
use crate::headers::{HeaderName, HeaderValue};
use crate::http::{RequestHead, ResponseHead, StatusCode, Version};
use crate::result::{CodecResult, DecoderResult};
use crate::upgrade::{UpgradeDecoder, UpgradeEncoder, UpgradeProvider};
use crate::ws;

/// Pairs a request [`h1::Decoder`] and response [`h1::Encoder`] for one
/// server-side connection.
pub struct ServerEngine {
    h1_decoder: h1::Decoder,
    h1_encoder: h1::Encoder,
    providers: Vec<Box<dyn UpgradeProvider>>,
    current_request: Option<RequestHead>,
    pending_switch: Option<usize>,
    upgraded: Option<(UpgradeDecoder, UpgradeEncoder)>,
    switched_to: Option<&'static str>,
    closing: ws::SharedClosingState,
}

impl ServerEngine {
    pub fn new(limits: Limits, providers: Vec<Box<dyn UpgradeProvider>>) -> Self {
        Self {
            h1_decoder: h1::Decoder::new(Role::Server, limits),
            h1_encoder: h1::Encoder::new(),
            providers,
            current_request: None,
            pending_switch: None,
            upgraded: None,
            switched_to: None,
            closing: ws::close::new_shared(),
        }
    }

    pub fn current_request(&self) -> Option<&RequestHead> {
        self.current_request.as_ref()
    }

    pub fn switched_to(&self) -> Option<&str> {
        self.switched_to
    }

    /// Decode request bytes. Invalid once [`Self::switched_to`] is set;
    /// use [`Self::decode_frame`] for the upgraded protocol instead.
    pub fn decode(
        &mut self,
        input: &mut BytesMut,
        out: &mut BytesMut,
        end_of_input: bool,
    ) -> Result<DecoderResult, Error> {
        if self.upgraded.is_some() {
            return Err(Error::state("decode called after switching protocols, use decode_frame"));
        }
        let result = self.h1_decoder.decode(input, out, end_of_input)?;
        if result.header_completed {
            if let DecodedHead::Request(req) = self.h1_decoder.take_head() {
                self.current_request = Some(req);
            }
        }
        Ok(result)
    }

    /// Write `resp`'s start line and headers, completing its skeleton
    /// with the protocol version, a `Date` field, and `Connection: close`
    /// when the request demands it, before delegating to the underlying
    /// encoder. A `101` response matching a registered upgrade provider
    /// arms the protocol switch, which takes effect once the response
    /// finishes encoding.
    pub fn encode_header(&mut self, mut resp: ResponseHead, has_payload: bool, out: &mut BytesMut) -> Result<(), Error> {
        if self.upgraded.is_some() {
            return Err(Error::state("encode_header called after switching protocols, use encode_frame"));
        }

        if !resp.headers.contains_key("date") {
            resp.headers.insert(
                HeaderName::from_static("date"),
                HeaderValue::try_from_string(Instant::now().serialize()).expect("rfc1123 date is valid header text"),
            );
        }
        if self.current_request.as_ref().map(wants_close).unwrap_or(false) && !resp.headers.contains_key("connection") {
            resp.headers.insert(HeaderName::from_static("connection"), HeaderValue::from_static("close"));
        }

        self.pending_switch = None;
        if resp.status == StatusCode::SWITCHING_PROTOCOLS {
            if let Some(req) = &self.current_request {
                if let Some(proto) = req.headers.get("upgrade").and_then(|v| v.to_str().ok()) {
                    self.pending_switch = self.providers.iter().position(|p| p.supports(proto));
                }
            }
        }

        self.h1_encoder.encode_header(HeadOut::Response(resp), has_payload, out)
    }

    pub fn encode(&mut self, input: &mut dyn Buf, out: &mut BytesMut, end_of_input: bool) -> Result<CodecResult, Error> {
        if self.upgraded.is_some() {
            return Err(Error::state("encode called after switching protocols, use encode_frame"));
        }
        let result = self.h1_encoder.encode(input, out, end_of_input)?;
        self.maybe_switch();
        Ok(result)
    }

    pub fn encode_flush(&mut self, out: &mut BytesMut) -> Result<CodecResult, Error> {
        if self.upgraded.is_some() {
            return Err(Error::state("encode_flush called after switching protocols"));
        }
        let result = self.h1_encoder.encode_flush(out)?;
        self.maybe_switch();
        Ok(result)
    }

    fn maybe_switch(&mut self) {
        if !self.h1_encoder.is_idle() {
            return;
        }
        let Some(idx) = self.pending_switch.take() else { return };
        let provider = &self.providers[idx];
        let (decoder, encoder) = provider.server_codecs(self.closing.clone());
        self.switched_to = Some(provider.protocol());
        self.upgraded = Some((decoder, encoder));
    }

    /// Decode one WebSocket frame once [`Self::switched_to`] is `Some`.
    pub fn decode_frame(&mut self, input: &mut BytesMut, out: &mut BytesMut) -> Result<ws::FrameResult, Error> {
        match &mut self.upgraded {
            Some((UpgradeDecoder::WebSocket(decoder), _)) => decoder.decode(input, out),
            _ => Err(Error::state("no active upgrade to decode frames for")),
        }
    }

    /// Encode one WebSocket frame once [`Self::switched_to`] is `Some`.
    pub fn encode_frame(
        &mut self,
        opcode: ws::OpCode,
        fin: bool,
        payload: &mut dyn Buf,
        out: &mut BytesMut,
    ) -> Result<CodecResult, Error> {
        match &mut self.upgraded {
            Some((_, UpgradeEncoder::WebSocket(encoder))) => {
                encoder.encode_header(opcode, fin, payload.remaining() as u64, out)?;
                encoder.encode(payload, out)
            }
            _ => Err(Error::state("no active upgrade to encode frames for")),
        }
    }
}

impl std::fmt::Debug for ServerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerEngine")
            .field("current_request", &self.current_request)
            .field("switched_to", &self.switched_to)
            .finish_non_exhaustive()
    }
}

fn wants_close(req: &RequestHead) -> bool {
    let connection = req.headers.get("connection").and_then(|v| v.to_str().ok()).unwrap_or("").to_ascii_lowercase();
    connection.contains("close") || (req.version == Version::HTTP_10 && !connection.contains("keep-alive"))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::http::Method;
    use crate::upgrade::WebSocketUpgrade;

    #[test]
    fn completes_request_response_cycle() {
        let mut engine = ServerEngine::new(Limits::default(), Vec::new());
        let mut input = BytesMut::from(&b"GET /hi HTTP/1.1\r\nHost: x\r\n\r\n"[..]);
        let mut body = BytesMut::with_capacity(64);
        let result = engine.decode(&mut input, &mut body, false).unwrap();
        assert!(result.header_completed);
        assert_eq!(engine.current_request().unwrap().method, Method::GET);

        let resp = ResponseHead::new(StatusCode::OK, Method::GET);
        let mut out = BytesMut::with_capacity(256);
        engine.encode_header(resp, false, &mut out).unwrap();
        engine.encode_flush(&mut out).unwrap();
        let text = String::from_utf8(out.to_vec()).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("date:"));
    }

    #[test]
    fn switches_protocol_on_matching_upgrade() {
        let providers: Vec<Box<dyn UpgradeProvider>> = vec![Box::new(WebSocketUpgrade::default())];
        let mut engine = ServerEngine::new(Limits::default(), providers);
        let mut input = BytesMut::from(
            &b"GET /ws HTTP/1.1\r\nHost: x\r\nConnection: Upgrade\r\nUpgrade: websocket\r\n\
Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\nSec-WebSocket-Version: 13\r\n\r\n"[..],
        );
        let mut body = BytesMut::with_capacity(64);
        engine.decode(&mut input, &mut body, false).unwrap();

        let req = engine.current_request().unwrap().clone();
        let mut resp = ResponseHead::new(StatusCode::SWITCHING_PROTOCOLS, req.method);
        resp.headers.insert(HeaderName::from_static("connection"), HeaderValue::from_static("Upgrade"));
        resp.headers.insert(HeaderName::from_static("upgrade"), HeaderValue::from_static("websocket"));
        let provider = WebSocketUpgrade::default();
        provider.augment_initial_response(&req, &mut resp).unwrap();

        let mut out = BytesMut::with_capacity(256);
        engine.encode_header(resp, false, &mut out).unwrap();
        assert!(engine.switched_to().is_none());
        engine.encode_flush(&mut out).unwrap();
        assert_eq!(engine.switched_to(), Some("websocket"));
    }
}
