//! Unified error model shared by the field, header, HTTP, and WebSocket
//! layers.
use std::fmt;

/// Error produced by any codec operation in this crate.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// The kind of failure that produced an [`Error`].
///
/// See the module documentation of [`crate::error`] for the policy that
/// decides which kind is used where.
#[derive(Debug)]
pub enum ErrorKind {
    /// Malformed syntax. Carries the offending text and the byte offset
    /// within the buffer that was being parsed.
    Parse {
        message: &'static str,
        offset: usize,
    },
    /// Well-formed input that is forbidden by protocol rules, e.g.
    /// `Transfer-Encoding` and `Content-Length` both present, or a
    /// WebSocket reserved bit set.
    Protocol(&'static str),
    /// A configured [`Limits`](crate::h1::Limits) ceiling was exceeded.
    Limit(&'static str),
    /// Invalid UTF-8 where the protocol requires it (WebSocket text
    /// frames).
    Encoding(&'static str),
    /// The caller misused the API, e.g. starting a new message before
    /// the previous one finished encoding.
    State(&'static str),
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self { kind }
    }
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub(crate) fn parse(message: &'static str, offset: usize) -> Self {
        ErrorKind::Parse { message, offset }.into()
    }

    pub(crate) fn protocol(message: &'static str) -> Self {
        ErrorKind::Protocol(message).into()
    }

    pub(crate) fn limit(message: &'static str) -> Self {
        ErrorKind::Limit(message).into()
    }

    pub(crate) fn encoding(message: &'static str) -> Self {
        ErrorKind::Encoding(message).into()
    }

    pub(crate) fn state(message: &'static str) -> Self {
        ErrorKind::State(message).into()
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Parse { message, offset } => {
                write!(f, "parse error at byte {offset}: {message}")
            }
            ErrorKind::Protocol(msg) => write!(f, "protocol error: {msg}"),
            ErrorKind::Limit(msg) => write!(f, "limit exceeded: {msg}"),
            ErrorKind::Encoding(msg) => write!(f, "encoding error: {msg}"),
            ErrorKind::State(msg) => write!(f, "invalid codec state: {msg}"),
        }
    }
}
