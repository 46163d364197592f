//! HTTP header field values.
use bytes::Bytes;

use crate::headers::error::InvalidHeaderValue;

/// A header field value: the raw bytes after `: ` and before the line
/// terminator, validated to exclude control characters other than
/// horizontal tab (RFC 9110 §5.5).
#[derive(Clone)]
pub struct HeaderValue {
    bytes: Bytes,
}

impl HeaderValue {
    pub fn from_static(value: &'static str) -> Self {
        Self::try_from_bytes(Bytes::from_static(value.as_bytes()))
            .expect("invalid static header value")
    }

    pub fn try_from_bytes(bytes: Bytes) -> Result<Self, InvalidHeaderValue> {
        if !valid(&bytes) {
            return Err(InvalidHeaderValue);
        }
        Ok(Self { bytes })
    }

    pub fn try_copy_from_slice(value: &[u8]) -> Result<Self, InvalidHeaderValue> {
        Self::try_from_bytes(Bytes::copy_from_slice(value))
    }

    pub fn try_from_string(value: impl Into<String>) -> Result<Self, InvalidHeaderValue> {
        Self::try_from_bytes(Bytes::from(value.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.bytes)
    }
}

fn valid(value: &[u8]) -> bool {
    value.iter().all(|&b| (b >= b' ' && b != 0x7f) || b == b'\t')
}

impl PartialEq for HeaderValue {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}
impl Eq for HeaderValue {}

impl PartialEq<str> for HeaderValue {
    fn eq(&self, other: &str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl std::str::FromStr for HeaderValue {
    type Err = InvalidHeaderValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_copy_from_slice(s.as_bytes())
    }
}

impl std::fmt::Debug for HeaderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_str() {
            Ok(s) => write!(f, "{s:?}"),
            Err(_) => write!(f, "{:?}", self.bytes.as_ref()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accepts_tab_rejects_control() {
        assert!(HeaderValue::try_copy_from_slice(b"a\tb").is_ok());
        assert!(HeaderValue::try_copy_from_slice(b"a\nb").is_err());
        assert!(HeaderValue::try_copy_from_slice(b"a\x7fb").is_err());
    }

    #[test]
    fn to_str_roundtrips() {
        let v = HeaderValue::try_from_string("hello").unwrap();
        assert_eq!(v.to_str().unwrap(), "hello");
    }
}
