//! Result types returned by the codec `decode`/`encode` calls.
use crate::http::ResponseHead;

/// Outcome common to every `decode`/`encode` call: how much of the
/// caller's buffers was consumed, and whether the transport should be
/// torn down afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodecResult {
    /// More input is needed before progress can resume.
    pub underflow: bool,
    /// The caller's output buffer ran out of room; call again with more
    /// capacity (or after draining it) to continue.
    pub overflow: bool,
    /// The transport must be closed once any attached response has been
    /// sent.
    pub close_connection: bool,
}

impl CodecResult {
    pub(crate) fn underflow() -> Self {
        Self { underflow: true, ..Self::default() }
    }

    pub(crate) fn overflow() -> Self {
        Self { overflow: true, ..Self::default() }
    }
}

/// Result of a single `h1::Decoder::decode`/`Engine::decode` call.
#[derive(Debug, Default)]
pub struct DecoderResult {
    pub codec: CodecResult,
    /// This call finished parsing the start line and headers of the
    /// current message.
    pub header_completed: bool,
    /// A synthesized response the caller must encode and send
    /// immediately (100-continue, or an automatic protocol-error reply).
    pub response: Option<ResponseHead>,
    /// No further application handling is needed beyond sending
    /// `response` (the request was a protocol violation, or this is an
    /// automatic reply such as 100-continue).
    pub response_only: bool,
}

impl DecoderResult {
    pub(crate) fn from_codec(codec: CodecResult) -> Self {
        Self { codec, ..Self::default() }
    }
}
