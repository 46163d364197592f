//! Client-side connection engine: response decoder + request encoder,
//! swapping to an upgraded protocol after a successful `101` exchange.
use bytes::{Buf, BytesMut};

use crate::error::Error;
use crate::h1::{self, DecodedHead, HeadOut, Limits, Role};
use crate::http::{RequestHead, ResponseHead, StatusCode};
use crate::result::{CodecResult, DecoderResult};
use crate::upgrade::{UpgradeDecoder, UpgradeEncoder, UpgradeProvider};
use crate::ws;

/// Pairs a response [`h1::Decoder`] and request [`h1::Encoder`] for one
/// client-side connection.
pub struct ClientEngine {
    h1_decoder: h1::Decoder,
    h1_encoder: h1::Encoder,
    providers: Vec<Box<dyn UpgradeProvider>>,
    pending_request: Option<RequestHead>,
    pending_switch: Option<usize>,
    upgraded: Option<(UpgradeDecoder, UpgradeEncoder)>,
    switched_to: Option<&'static str>,
    closing: ws::SharedClosingState,
}

impl ClientEngine {
    pub fn new(limits: Limits, providers: Vec<Box<dyn UpgradeProvider>>) -> Self {
        Self {
            h1_decoder: h1::Decoder::new(Role::Client, limits),
            h1_encoder: h1::Encoder::new(),
            providers,
            pending_request: None,
            pending_switch: None,
            upgraded: None,
            switched_to: None,
            closing: ws::close::new_shared(),
        }
    }

    pub fn switched_to(&self) -> Option<&str> {
        self.switched_to
    }

    /// Write `req`'s start line and headers. If `req` names an
    /// `Upgrade:` protocol a registered provider supports, the provider
    /// augments the request (e.g. `Sec-WebSocket-Key`) before it is sent
    /// and the matching response is checked against it.
    pub fn encode_header(&mut self, mut req: RequestHead, has_payload: bool, out: &mut BytesMut) -> Result<(), Error> {
        if self.upgraded.is_some() {
            return Err(Error::state("encode_header called after switching protocols, use encode_frame"));
        }

        self.pending_switch = None;
        if let Some(proto) = req.headers.get("upgrade").and_then(|v| v.to_str().ok()).map(str::to_string) {
            if let Some(idx) = self.providers.iter().position(|p| p.supports(&proto)) {
                self.providers[idx].augment_initial_request(&mut req)?;
                self.pending_switch = Some(idx);
            }
        }

        self.h1_decoder.note_request(req.method);
        self.pending_request = Some(req.clone());
        self.h1_encoder.encode_header(HeadOut::Request(req), has_payload, out)
    }

    pub fn encode(&mut self, input: &mut dyn Buf, out: &mut BytesMut, end_of_input: bool) -> Result<CodecResult, Error> {
        if self.upgraded.is_some() {
            return Err(Error::state("encode called after switching protocols, use encode_frame"));
        }
        self.h1_encoder.encode(input, out, end_of_input)
    }

    pub fn encode_flush(&mut self, out: &mut BytesMut) -> Result<CodecResult, Error> {
        if self.upgraded.is_some() {
            return Err(Error::state("encode_flush called after switching protocols"));
        }
        self.h1_encoder.encode_flush(out)
    }

    /// Decode response bytes. Invalid once [`Self::switched_to`] is set;
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
            if let DecodedHead::Response(resp) = self.h1_decoder.take_head() {
                self.check_switch(&resp)?;
            }
        }
        Ok(result)
    }

    fn check_switch(&mut self, resp: &ResponseHead) -> Result<(), Error> {
        let Some(idx) = self.pending_switch.take() else { return Ok(()) };
        let Some(req) = &self.pending_request else { return Ok(()) };
        if resp.status != StatusCode::SWITCHING_PROTOCOLS {
            return Ok(());
        }
        let provider = &self.providers[idx];
        provider.check_switching_response(req, resp)?;
        let (decoder, encoder) = provider.client_codecs(self.closing.clone());
        self.switched_to = Some(provider.protocol());
        self.upgraded = Some((decoder, encoder));
        Ok(())
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

impl std::fmt::Debug for ClientEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientEngine")
            .field("pending_request", &self.pending_request)
            .field("switched_to", &self.switched_to)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::http::{Method, Version};
    use crate::upgrade::WebSocketUpgrade;

    #[test]
    fn switches_protocol_on_matching_accept() {
        let providers: Vec<Box<dyn UpgradeProvider>> = vec![Box::new(WebSocketUpgrade::default())];
        let mut engine = ClientEngine::new(Limits::default(), providers);

        let mut req = RequestHead { method: Method::GET, target: "/ws".into(), version: Version::HTTP_11, headers: Default::default() };
        req.headers.insert(
            crate::headers::HeaderName::from_static("upgrade"),
            crate::headers::HeaderValue::from_static("websocket"),
        );
        req.headers.insert(
            crate::headers::HeaderName::from_static("connection"),
            crate::headers::HeaderValue::from_static("Upgrade"),
        );
        req.headers.insert(
            crate::headers::HeaderName::from_static("sec-websocket-key"),
            crate::headers::HeaderValue::from_static("dGhlIHNhbXBsZSBub25jZQ=="),
        );
        let mut out = BytesMut::with_capacity(256);
        engine.encode_header(req, false, &mut out).unwrap();
        engine.encode_flush(&mut out).unwrap();

        let mut input = BytesMut::from(
            &b"HTTP/1.1 101 Switching Protocols\r\nConnection: Upgrade\r\nUpgrade: websocket\r\n\
Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\r\n"[..],
        );
        let mut body = BytesMut::with_capacity(64);
        let result = engine.decode(&mut input, &mut body, false).unwrap();
        assert!(result.header_completed);
        assert_eq!(engine.switched_to(), Some("websocket"));
    }
}
