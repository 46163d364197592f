//! Integer field values, e.g. `Content-Length`, `Retry-After` (delta form),
//! `Max-Forwards`.
use crate::error::Error;

/// Parse a field value as a non-negative 64-bit decimal integer. Used for
/// `Content-Length`, which rejects signs and leading/trailing garbage.
pub fn parse_non_negative(input: &[u8]) -> Result<u64, Error> {
    let input = super::trim(input);
    if input.is_empty() || !input.iter().all(u8::is_ascii_digit) {
        return Err(Error::parse("expected non-negative integer", 0));
    }
    std::str::from_utf8(input)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| Error::parse("integer out of range", 0))
}

/// Parse a field value as a signed 64-bit decimal integer.
pub fn parse_signed(input: &[u8]) -> Result<i64, Error> {
    let input = super::trim(input);
    let (sign, digits) = match input.first() {
        Some(b'-') => (-1i64, &input[1..]),
        Some(b'+') => (1i64, &input[1..]),
        _ => (1i64, input),
    };
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(Error::parse("expected integer", 0));
    }
    let magnitude: i64 = std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::parse("integer out of range", 0))?;
    Ok(sign * magnitude)
}

pub fn serialize(value: u64) -> String {
    let mut buf = itoa::Buffer::new();
    buf.format(value).to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn content_length_rejects_sign() {
        assert!(parse_non_negative(b"-1").is_err());
        assert!(parse_non_negative(b"+1").is_err());
        assert_eq!(parse_non_negative(b"13").unwrap(), 13);
    }

    #[test]
    fn signed_allows_negative() {
        assert_eq!(parse_signed(b"-120").unwrap(), -120);
        assert_eq!(parse_signed(b"120").unwrap(), 120);
    }
}
