//! Typed HTTP field-value converters.
//!
//! Each converter here is a strict `parse`/`serialize` pair over a field
//! value's text representation (the bytes after the header's `: `, not
//! including the header name or line terminator). Parsing rejects
//! trailing garbage except for grammar-permitted whitespace, and reports
//! the byte offset of the first offending character on failure.
mod commented;
mod cookie;
mod instant;
mod integer;
mod list;
mod media_range;
mod parameterized;
mod weighted;

pub use commented::Commented;
pub use cookie::{Cookie, SetCookie};
pub use instant::Instant;
pub use list::List;
pub use media_range::MediaRange;
pub use parameterized::Parameterized;
pub use weighted::{Weighted, WeightedList};

use crate::error::Error;

/// tchar, RFC 7230 §3.2.6.
pub fn is_tchar(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~'
        )
}

/// Parse a single token (RFC 7230 tchar run). Returns the token and the
/// unconsumed remainder.
pub fn parse_token(input: &[u8]) -> Result<(&str, &[u8]), Error> {
    let len = input.iter().position(|&b| !is_tchar(b)).unwrap_or(input.len());
    if len == 0 {
        return Err(Error::parse("expected token", 0));
    }
    let token = std::str::from_utf8(&input[..len]).map_err(|_| Error::parse("non-ASCII token", 0))?;
    Ok((token, &input[len..]))
}

/// Parse a whole field value as a single strict token (no trailing
/// content other than the value itself).
pub fn parse_token_strict(input: &[u8]) -> Result<&str, Error> {
    let trimmed = trim(input);
    let (token, rest) = parse_token(trimmed)?;
    if !rest.is_empty() {
        return Err(Error::parse("trailing garbage after token", token.len()));
    }
    Ok(token)
}

/// Parse either a quoted-string or a bare token, per RFC 7230 §3.2.6.
/// Returns the unescaped value and the unconsumed remainder.
pub fn parse_quoted_or_token(input: &[u8]) -> Result<(String, &[u8]), Error> {
    if input.first() == Some(&b'"') {
        parse_quoted_string(input)
    } else {
        let (token, rest) = parse_token(input)?;
        Ok((token.to_string(), rest))
    }
}

/// Parse a `"..."` quoted-string with backslash escapes starting at
/// `input[0] == b'"'`.
pub fn parse_quoted_string(input: &[u8]) -> Result<(String, &[u8]), Error> {
    debug_assert_eq!(input.first(), Some(&b'"'));
    let mut out = String::new();
    let mut i = 1;
    loop {
        match input.get(i) {
            None => return Err(Error::parse("unterminated quoted string", i)),
            Some(b'"') => {
                i += 1;
                break;
            }
            Some(b'\\') => match input.get(i + 1) {
                Some(&c) => {
                    out.push(c as char);
                    i += 2;
                }
                None => return Err(Error::parse("dangling escape in quoted string", i)),
            },
            Some(&c) => {
                out.push(c as char);
                i += 1;
            }
        }
    }
    Ok((out, &input[i..]))
}

/// Serialize `value` as a token if possible, quoting it otherwise.
pub fn quote_if_needed(value: &str) -> String {
    if !value.is_empty() && value.bytes().all(is_tchar) {
        value.to_string()
    } else {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('"');
        for c in value.chars() {
            if c == '"' || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('"');
        out
    }
}

/// Trim leading/trailing optional-whitespace (RFC 7230 OWS: space and
/// horizontal tab).
pub fn trim(input: &[u8]) -> &[u8] {
    let start = input.iter().position(|&b| b != b' ' && b != b'\t').unwrap_or(input.len());
    let input = &input[start..];
    let end = input.iter().rposition(|&b| b != b' ' && b != b'\t').map_or(0, |p| p + 1);
    &input[..end]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn token_stops_at_delimiter() {
        let (tok, rest) = parse_token(b"gzip;q=1").unwrap();
        assert_eq!(tok, "gzip");
        assert_eq!(rest, b";q=1");
    }

    #[test]
    fn quoted_string_unescapes() {
        let (val, rest) = parse_quoted_string(br#""a\"b" trailing"#).unwrap();
        assert_eq!(val, "a\"b");
        assert_eq!(rest, b" trailing");
    }

    #[test]
    fn quote_if_needed_leaves_tokens_bare() {
        assert_eq!(quote_if_needed("gzip"), "gzip");
        assert_eq!(quote_if_needed("a b"), "\"a b\"");
    }

    #[test]
    fn trim_strips_ows() {
        assert_eq!(trim(b"  abc\t "), b"abc");
    }
}
