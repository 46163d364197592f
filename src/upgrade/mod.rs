//! Pluggable strategies for negotiating `Connection: Upgrade`.
pub mod websocket;

pub use websocket::WebSocketUpgrade;

use crate::error::Error;
use crate::http::{RequestHead, ResponseHead};
use crate::ws::{self, SharedClosingState};

/// One of the codecs handed back by an [`UpgradeProvider`] after a
/// successful protocol switch.
#[derive(Debug)]
pub enum UpgradeDecoder {
    WebSocket(ws::Decoder),
}

#[derive(Debug)]
pub enum UpgradeEncoder {
    WebSocket(ws::Encoder),
}

/// A strategy for negotiating and then taking over a `Connection:
/// Upgrade` exchange for one protocol.
pub trait UpgradeProvider {
    /// The `Upgrade:` token this provider negotiates, e.g. `"websocket"`.
    fn protocol(&self) -> &'static str;

    fn supports(&self, protocol: &str) -> bool {
        protocol.eq_ignore_ascii_case(self.protocol())
    }

    /// Client side: populate whatever headers the handshake needs
    /// (a `Sec-WebSocket-Key`, protocol version, ...) before the initial
    /// request is sent.
    fn augment_initial_request(&self, req: &mut RequestHead) -> Result<(), Error>;

    /// Server side: having accepted the upgrade, populate the `101`
    /// response's protocol-specific headers. Sets `resp.status` to an
    /// error status and clears its body instead if the request is
    /// malformed for this protocol.
    fn augment_initial_response(&self, req: &RequestHead, resp: &mut ResponseHead) -> Result<(), Error>;

    /// Client side: having received a `101` response, verify it actually
    /// answers the request this provider sent.
    fn check_switching_response(&self, req: &RequestHead, resp: &ResponseHead) -> Result<(), Error>;

    fn server_codecs(&self, closing: SharedClosingState) -> (UpgradeDecoder, UpgradeEncoder);
    fn client_codecs(&self, closing: SharedClosingState) -> (UpgradeDecoder, UpgradeEncoder);
}
