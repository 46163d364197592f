//! Token (or quoted-string) values carrying `;key=value` parameters, e.g.
//! `Content-Disposition: attachment; filename="x.txt"`.
use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameterized {
    value: String,
    params: Vec<(String, String)>,
}

impl Parameterized {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into(), params: Vec::new() }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn parse(input: &[u8]) -> Result<Self, Error> {
        let (value, rest) = super::parse_quoted_or_token(input)?;
        let mut params = Vec::new();
        let mut rest = super::trim(rest);
        while !rest.is_empty() {
            rest = match rest.first() {
                Some(b';') => &rest[1..],
                _ => return Err(Error::parse("expected ';' before parameter", 0)),
            };
            rest = super::trim(rest);
            let (name, after_name) = super::parse_token(rest)?;
            let after_name = super::trim(after_name);
            let after_eq = match after_name.first() {
                Some(b'=') => &after_name[1..],
                _ => return Err(Error::parse("expected '=' in parameter", 0)),
            };
            let (val, after_val) = super::parse_quoted_or_token(after_eq)?;
            params.push((name.to_string(), val));
            rest = super::trim(after_val);
        }
        Ok(Self { value, params })
    }

    pub fn serialize(&self) -> String {
        let mut out = super::quote_if_needed(&self.value);
        for (k, v) in &self.params {
            out.push_str("; ");
            out.push_str(k);
            out.push('=');
            out.push_str(&super::quote_if_needed(v));
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_value_and_params() {
        let p = Parameterized::parse(br#"attachment; filename="x.txt""#).unwrap();
        assert_eq!(p.value(), "attachment");
        assert_eq!(p.param("filename"), Some("x.txt"));
    }

    #[test]
    fn param_lookup_is_case_insensitive() {
        let p = Parameterized::parse(b"text/html; charset=utf-8").unwrap();
        assert_eq!(p.param("CHARSET"), Some("utf-8"));
    }

    #[test]
    fn serialize_quotes_params_needing_it() {
        let p = Parameterized::new("attachment").with_param("filename", "a b.txt");
        assert_eq!(p.serialize(), r#"attachment; filename="a b.txt""#);
    }
}
