//! HTTP status codes, per RFC 9110 §15.
use std::num::NonZeroU16;

use crate::error::Error;

/// An HTTP status code in `100..=599`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(NonZeroU16);

macro_rules! status_codes {
    ($($(#[$doc:meta])* $int:literal $id:ident $msg:literal;)*) => {
        impl StatusCode {
            $(
                $(#[$doc])*
                pub const $id: Self = Self(match NonZeroU16::new($int) { Some(n) => n, None => panic!("zero status code") });
            )*

            pub fn from_u16(code: u16) -> Result<Self, Error> {
                match code {
                    $($int => Ok(Self::$id),)*
                    100..=599 => Ok(Self(NonZeroU16::new(code).unwrap())),
                    _ => Err(Error::parse("status code out of range", 0)),
                }
            }

            /// The reason phrase for well-known codes; `"Unknown"` for
            /// any other in-range code.
            pub fn canonical_reason(&self) -> &'static str {
                match self.0.get() {
                    $($int => $msg,)*
                    _ => "Unknown",
                }
            }
        }
    };
}

status_codes! {
    /// `100`, the server has received the request headers.
    100 CONTINUE "Continue";
    /// `101`, sent in response to an `Upgrade` request header.
    101 SWITCHING_PROTOCOLS "Switching Protocols";
    /// `200`, the request succeeded.
    200 OK "OK";
    /// `201`, the request succeeded and a new resource was created.
    201 CREATED "Created";
    /// `204`, there is no content to send, but the headers are useful.
    204 NO_CONTENT "No Content";
    /// `206`, delivering only part of the resource, due to a range header.
    206 PARTIAL_CONTENT "Partial Content";
    /// `301`, the resource has been moved permanently.
    301 MOVED_PERMANENTLY "Moved Permanently";
    /// `302`, the resource has been moved temporarily.
    302 FOUND "Found";
    /// `303`, direct the client to another URI with a GET request.
    303 SEE_OTHER "See Other";
    /// `304`, there is no need to retransmit the requested resource.
    304 NOT_MODIFIED "Not Modified";
    /// `307`, the resource has moved temporarily, method unchanged.
    307 TEMPORARY_REDIRECT "Temporary Redirect";
    /// `400`, the server cannot process the request due to a client error.
    400 BAD_REQUEST "Bad Request";
    /// `401`, the client must authenticate to get the requested response.
    401 UNAUTHORIZED "Unauthorized";
    /// `403`, the client does not have access rights to the content.
    403 FORBIDDEN "Forbidden";
    /// `404`, the server cannot find the requested resource.
    404 NOT_FOUND "Not Found";
    /// `405`, the request method is known but not supported.
    405 METHOD_NOT_ALLOWED "Method Not Allowed";
    /// `408`, the server timed out waiting for the request.
    408 REQUEST_TIMEOUT "Request Timeout";
    /// `409`, the request conflicts with the current state of the resource.
    409 CONFLICT "Conflict";
    /// `411`, the request did not specify the length of its content.
    411 LENGTH_REQUIRED "Length Required";
    /// `413`, the request entity is larger than limits the server allows.
    413 PAYLOAD_TOO_LARGE "Payload Too Large";
    /// `414`, the URI requested by the client is too long.
    414 URI_TOO_LONG "URI Too Long";
    /// `417`, the expectation given in the `Expect` header could not be met.
    417 EXPECTATION_FAILED "Expectation Failed";
    /// `426`, the server refuses to perform the request using the current
    /// protocol, requiring `Upgrade`.
    426 UPGRADE_REQUIRED "Upgrade Required";
    /// `431`, the server is unwilling to process the request because its
    /// header fields are too large.
    431 REQUEST_HEADER_FIELDS_TOO_LARGE "Request Header Fields Too Large";
    /// `500`, the server encountered an unexpected condition.
    500 INTERNAL_SERVER_ERROR "Internal Server Error";
    /// `501`, the request method is not supported by the server.
    501 NOT_IMPLEMENTED "Not Implemented";
    /// `505`, the HTTP version used in the request is not supported.
    505 HTTP_VERSION_NOT_SUPPORTED "HTTP Version Not Supported";
}

impl StatusCode {
    pub fn as_u16(&self) -> u16 {
        self.0.get()
    }

    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.as_u16())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.as_u16())
    }

    pub fn is_redirection(&self) -> bool {
        (300..400).contains(&self.as_u16())
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        Self::OK
    }
}

impl std::fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.canonical_reason())
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn well_known_reason_phrases() {
        assert_eq!(StatusCode::OK.canonical_reason(), "OK");
        assert_eq!(StatusCode::NOT_FOUND.canonical_reason(), "Not Found");
    }

    #[test]
    fn classifies_by_range() {
        assert!(StatusCode::OK.is_success());
        assert!(StatusCode::NOT_FOUND.is_client_error());
        assert!(StatusCode::INTERNAL_SERVER_ERROR.is_server_error());
    }

    #[test]
    fn accepts_arbitrary_in_range_code() {
        let s = StatusCode::from_u16(218).unwrap();
        assert_eq!(s.canonical_reason(), "Unknown");
    }

    #[test]
    fn rejects_out_of_range_code() {
        assert!(StatusCode::from_u16(99).is_err());
        assert!(StatusCode::from_u16(600).is_err());
    }
}
