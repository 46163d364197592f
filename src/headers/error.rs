//! Header name/value validation errors.

/// The bytes given to [`HeaderName::new`](super::HeaderName::new) were
/// not a valid `token` (RFC 7230 §3.2.6).
#[derive(Debug)]
pub struct InvalidHeaderName;

impl std::error::Error for InvalidHeaderName {}

impl std::fmt::Display for InvalidHeaderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("invalid header name")
    }
}

/// The bytes given to a `HeaderValue` constructor contained a control
/// character other than horizontal tab.
#[derive(Debug)]
pub struct InvalidHeaderValue;

impl std::error::Error for InvalidHeaderValue {}

impl std::fmt::Display for InvalidHeaderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("invalid header value")
    }
}
