//! Request/response start lines plus their header block.
use crate::headers::HeaderMap;
use crate::http::{Method, StatusCode, Version};

/// The decoded start line and headers of an HTTP request.
#[derive(Debug, Default, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub target: String,
    pub version: Version,
    pub headers: HeaderMap,
}

/// The decoded start line and headers of an HTTP response.
///
/// `request_method` is carried alongside the response because framing
/// rules for the response body depend on the request method that
/// produced it (e.g. a `HEAD` response never has a body regardless of
/// `Content-Length`).
#[derive(Debug)]
pub struct ResponseHead {
    pub version: Version,
    pub status: StatusCode,
    pub reason: Option<String>,
    pub headers: HeaderMap,
    pub request_method: Method,
}

impl ResponseHead {
    pub fn new(status: StatusCode, request_method: Method) -> Self {
        Self {
            version: Version::HTTP_11,
            status,
            reason: None,
            headers: HeaderMap::new(),
            request_method,
        }
    }

    /// The reason phrase to render: the caller-supplied one if present,
    /// else the status code's canonical reason.
    pub fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or_else(|| self.status.canonical_reason())
    }
}
