//! Ambient bounds on HTTP/1.1 message sizes.

/// Ceilings enforced while decoding a message. Exceeding any of them
/// produces a synthesized protocol response rather than growing buffers
/// without bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum length, in bytes, of the request/status line.
    pub max_start_line: usize,
    /// Maximum length, in bytes, of a single header line (including any
    /// folded continuation).
    pub max_header_line: usize,
    /// Maximum number of header fields in one message.
    pub max_header_count: usize,
    /// Maximum WebSocket data-frame payload. Control frames are capped
    /// at 125 bytes by RFC 6455 regardless of this setting.
    pub max_ws_frame: usize,
}

impl Limits {
    pub const fn new() -> Self {
        Self {
            max_start_line: 8 * 1024,
            max_header_line: 8 * 1024,
            max_header_count: 100,
            max_ws_frame: 16 * 1024 * 1024,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::new()
    }
}
