//! Token values with an optional trailing `(comment)`, per RFC 9110
//! §5.6.5, e.g. `Via: 1.1 proxy.example.com (squid/4.1)`.
use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commented {
    value: String,
    comment: Option<String>,
}

impl Commented {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into(), comment: None }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn parse(input: &[u8]) -> Result<Self, Error> {
        let (value, rest) = super::parse_token(input)?;
        let rest = super::trim(rest);
        let comment = if rest.first() == Some(&b'(') {
            Some(parse_comment(rest)?)
        } else if !rest.is_empty() {
            return Err(Error::parse("trailing garbage after value", 0));
        } else {
            None
        };
        Ok(Self { value: value.to_string(), comment })
    }

    pub fn serialize(&self) -> String {
        match &self.comment {
            Some(c) => format!("{} ({c})", self.value),
            None => self.value.clone(),
        }
    }
}

/// Parse a single `(...)` comment, with nesting and backslash escapes per
/// RFC 5322 §3.2.2.
fn parse_comment(input: &[u8]) -> Result<String, Error> {
    debug_assert_eq!(input.first(), Some(&b'('));
    let mut out = String::new();
    let mut depth = 0usize;
    let mut i = 0;
    loop {
        match input.get(i) {
            None => return Err(Error::parse("unterminated comment", i)),
            Some(b'(') => {
                depth += 1;
                if depth > 1 {
                    out.push('(');
                }
                i += 1;
            }
            Some(b')') => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    break;
                }
                out.push(')');
            }
            Some(b'\\') => match input.get(i + 1) {
                Some(&c) => {
                    out.push(c as char);
                    i += 2;
                }
                None => return Err(Error::parse("dangling escape in comment", i)),
            },
            Some(&c) => {
                out.push(c as char);
                i += 1;
            }
        }
    }
    if i != input.len() {
        return Err(Error::parse("trailing garbage after comment", i));
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_value_without_comment() {
        let c = Commented::parse(b"1.1").unwrap();
        assert_eq!(c.value(), "1.1");
        assert_eq!(c.comment(), None);
    }

    #[test]
    fn parses_value_with_comment() {
        let c = Commented::parse(b"proxy (squid/4.1)").unwrap();
        assert_eq!(c.value(), "proxy");
        assert_eq!(c.comment(), Some("squid/4.1"));
    }

    #[test]
    fn rejects_trailing_garbage_that_is_not_a_comment() {
        assert!(Commented::parse(b"1.1 proxy.example.com").is_err());
    }

    #[test]
    fn parses_nested_comment() {
        let c = Commented::parse(b"x (outer (inner))").unwrap();
        assert_eq!(c.comment(), Some("outer (inner)"));
    }

    #[test]
    fn serializes_with_comment() {
        let c = Commented::new("x").with_comment("note");
        assert_eq!(c.serialize(), "x (note)");
    }
}
