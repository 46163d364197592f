//! The WebSocket upgrade handshake, RFC 6455 §4.
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::RngCore;
use sha1::{Digest, Sha1};

use crate::error::Error;
use crate::h1::Limits;
use crate::headers::{HeaderName, HeaderValue};
use crate::http::{RequestHead, ResponseHead, StatusCode};
use crate::upgrade::{UpgradeDecoder, UpgradeEncoder, UpgradeProvider};
use crate::ws::{self, SharedClosingState};

const GUID: &[u8] = b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Negotiates `Connection: Upgrade` for the `websocket` protocol.
#[derive(Debug, Clone, Copy)]
pub struct WebSocketUpgrade {
    limits: Limits,
}

impl WebSocketUpgrade {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }
}

impl Default for WebSocketUpgrade {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}

impl UpgradeProvider for WebSocketUpgrade {
    fn protocol(&self) -> &'static str {
        "websocket"
    }

    fn augment_initial_request(&self, req: &mut RequestHead) -> Result<(), Error> {
        if !req.headers.contains_key("sec-websocket-version") {
            req.headers.insert(
                HeaderName::from_static("sec-websocket-version"),
                HeaderValue::from_static("13"),
            );
        }
        if !req.headers.contains_key("sec-websocket-key") {
            let mut nonce = [0u8; 16];
            rand::thread_rng().fill_bytes(&mut nonce);
            let key = STANDARD.encode(nonce);
            req.headers.insert(
                HeaderName::from_static("sec-websocket-key"),
                HeaderValue::try_from_string(key).expect("base64 key is valid header text"),
            );
        }
        Ok(())
    }

    fn augment_initial_response(&self, req: &RequestHead, resp: &mut ResponseHead) -> Result<(), Error> {
        let version_ok = req
            .headers
            .get("sec-websocket-version")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim() == "13")
            .unwrap_or(false);
        let key = req.headers.get("sec-websocket-key").and_then(|v| v.to_str().ok());

        let (Some(key), true) = (key, version_ok) else {
            resp.status = StatusCode::BAD_REQUEST;
            resp.headers = crate::headers::HeaderMap::new();
            return Ok(());
        };

        resp.headers.insert(
            HeaderName::from_static("sec-websocket-accept"),
            HeaderValue::try_from_string(derive_accept(key)).expect("base64 accept is valid header text"),
        );
        Ok(())
    }

    fn check_switching_response(&self, req: &RequestHead, resp: &ResponseHead) -> Result<(), Error> {
        let key = req
            .headers
            .get("sec-websocket-key")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::protocol("no Sec-WebSocket-Key was sent to check the response against"))?;
        let expected = derive_accept(key);
        let actual = resp.headers.get("sec-websocket-accept").and_then(|v| v.to_str().ok());
        if actual != Some(expected.as_str()) {
            return Err(Error::protocol("Sec-WebSocket-Accept does not match the request key"));
        }
        Ok(())
    }

    fn server_codecs(&self, closing: SharedClosingState) -> (UpgradeDecoder, UpgradeEncoder) {
        (
            UpgradeDecoder::WebSocket(ws::Decoder::new(true, self.limits, closing.clone())),
            UpgradeEncoder::WebSocket(ws::Encoder::new(false, closing)),
        )
    }

    fn client_codecs(&self, closing: SharedClosingState) -> (UpgradeDecoder, UpgradeEncoder) {
        (
            UpgradeDecoder::WebSocket(ws::Decoder::new(false, self.limits, closing.clone())),
            UpgradeEncoder::WebSocket(ws::Encoder::new(true, closing)),
        )
    }
}

fn derive_accept(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(GUID);
    STANDARD.encode(hasher.finalize())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn derives_the_accept_value_from_rfc6455_example() {
        assert_eq!(derive_accept("dGhlIHNhbXBsZSBub25jZQ=="), "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
    }

    #[test]
    fn rejects_request_missing_key() {
        let upgrade = WebSocketUpgrade::default();
        let req = RequestHead::default();
        let mut resp = ResponseHead::new(StatusCode::SWITCHING_PROTOCOLS, crate::http::Method::GET);
        upgrade.augment_initial_response(&req, &mut resp).unwrap();
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    }
}
