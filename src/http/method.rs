//! HTTP request methods, per RFC 9110 §9 and the `PATCH` method of
//! RFC 5789. Arbitrary/extension methods are not supported.
use crate::error::Error;

/// An HTTP request method.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Method(Inner);

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum Inner {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

impl Method {
    /// The [GET](https://www.rfc-editor.org/rfc/rfc9110.html#name-get) method.
    pub const GET: Self = Self(Inner::Get);
    /// The [HEAD](https://www.rfc-editor.org/rfc/rfc9110.html#name-head) method.
    pub const HEAD: Self = Self(Inner::Head);
    /// The [POST](https://www.rfc-editor.org/rfc/rfc9110.html#name-post) method.
    pub const POST: Self = Self(Inner::Post);
    /// The [PUT](https://www.rfc-editor.org/rfc/rfc9110.html#name-put) method.
    pub const PUT: Self = Self(Inner::Put);
    /// The [DELETE](https://www.rfc-editor.org/rfc/rfc9110.html#name-delete) method.
    pub const DELETE: Self = Self(Inner::Delete);
    /// The [CONNECT](https://www.rfc-editor.org/rfc/rfc9110.html#name-connect) method.
    pub const CONNECT: Self = Self(Inner::Connect);
    /// The [OPTIONS](https://www.rfc-editor.org/rfc/rfc9110.html#name-options) method.
    pub const OPTIONS: Self = Self(Inner::Options);
    /// The [TRACE](https://www.rfc-editor.org/rfc/rfc9110.html#name-trace) method.
    pub const TRACE: Self = Self(Inner::Trace);
    /// The [PATCH](https://www.rfc-editor.org/rfc/rfc5789#section-2) method.
    pub const PATCH: Self = Self(Inner::Patch);

    pub fn from_bytes(src: &[u8]) -> Option<Self> {
        Some(match src {
            b"GET" => Self::GET,
            b"HEAD" => Self::HEAD,
            b"POST" => Self::POST,
            b"PUT" => Self::PUT,
            b"DELETE" => Self::DELETE,
            b"CONNECT" => Self::CONNECT,
            b"OPTIONS" => Self::OPTIONS,
            b"TRACE" => Self::TRACE,
            b"PATCH" => Self::PATCH,
            _ => return None,
        })
    }

    pub fn parse(input: &[u8]) -> Result<Self, Error> {
        Self::from_bytes(input).ok_or_else(|| Error::parse("unknown or unsupported method", 0))
    }

    pub const fn as_str(&self) -> &'static str {
        match self.0 {
            Inner::Get => "GET",
            Inner::Head => "HEAD",
            Inner::Post => "POST",
            Inner::Put => "PUT",
            Inner::Delete => "DELETE",
            Inner::Connect => "CONNECT",
            Inner::Options => "OPTIONS",
            Inner::Trace => "TRACE",
            Inner::Patch => "PATCH",
        }
    }

    /// Methods whose semantics are essentially read-only: `GET`, `HEAD`,
    /// `OPTIONS`, `TRACE`.
    pub const fn is_safe(&self) -> bool {
        matches!(self.0, Inner::Get | Inner::Head | Inner::Options | Inner::Trace)
    }

    /// Methods where repeating an identical request has the same effect
    /// as sending it once: all safe methods, plus `PUT` and `DELETE`.
    pub const fn is_idempotent(&self) -> bool {
        self.is_safe() || matches!(self.0, Inner::Put | Inner::Delete)
    }

    /// Whether a request with this method carries a body by default
    /// (informational only — `Content-Length`/`Transfer-Encoding` still
    /// govern framing per RFC 9112 §6.3).
    pub const fn has_default_body(&self) -> bool {
        matches!(self.0, Inner::Post | Inner::Put | Inner::Patch)
    }
}

impl Default for Method {
    fn default() -> Self {
        Self::GET
    }
}

impl std::str::FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.as_bytes())
    }
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_known_methods() {
        assert_eq!(Method::parse(b"GET").unwrap(), Method::GET);
        assert_eq!(Method::parse(b"PATCH").unwrap(), Method::PATCH);
    }

    #[test]
    fn rejects_unknown_method() {
        assert!(Method::parse(b"FROB").is_err());
    }

    #[test]
    fn safety_and_idempotency_match_rfc_table() {
        assert!(Method::GET.is_safe());
        assert!(!Method::POST.is_safe());
        assert!(Method::PUT.is_idempotent());
        assert!(!Method::POST.is_idempotent());
    }
}
