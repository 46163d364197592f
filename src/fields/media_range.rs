//! `Accept`'s media-range field value: `type/subtype` plus parameters,
//! one of which (`q`) carries the preference weight and splits the
//! parameter list into media-type params and accept-params, per RFC 9110
//! §12.5.1.
use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRange {
    main_type: String,
    sub_type: String,
    params: Vec<(String, String)>,
    q: u16,
}

impl MediaRange {
    pub fn main_type(&self) -> &str {
        &self.main_type
    }

    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    pub fn quality(&self) -> u16 {
        self.q
    }

    /// Whether this range matches `other`'s type/subtype, treating `*` as
    /// a wildcard on either side.
    pub fn matches(&self, main: &str, sub: &str) -> bool {
        (self.main_type == "*" || self.main_type.eq_ignore_ascii_case(main))
            && (self.sub_type == "*" || self.sub_type.eq_ignore_ascii_case(sub))
    }

    pub fn parse(input: &[u8]) -> Result<Self, Error> {
        let (main_type, rest) = super::parse_token(input)?;
        let rest = rest.strip_prefix(b"/").ok_or_else(|| Error::parse("expected '/' in media range", 0))?;
        let (sub_type, rest) = super::parse_token(rest)?;

        let mut params = Vec::new();
        let mut q = 1000u16;
        let mut rest = super::trim(rest);
        while !rest.is_empty() {
            rest = rest.strip_prefix(b";").ok_or_else(|| Error::parse("expected ';' before parameter", 0))?;
            rest = super::trim(rest);
            let (name, after_name) = super::parse_token(rest)?;
            let after_name = super::trim(after_name);
            let after_eq = after_name.strip_prefix(b"=").ok_or_else(|| Error::parse("expected '='", 0))?;
            let (val, after_val) = super::parse_quoted_or_token(after_eq)?;
            if name.eq_ignore_ascii_case("q") {
                q = parse_q(&val)?;
            } else {
                params.push((name.to_string(), val));
            }
            rest = super::trim(after_val);
        }

        Ok(Self { main_type: main_type.to_string(), sub_type: sub_type.to_string(), params, q })
    }

    pub fn serialize(&self) -> String {
        let mut out = format!("{}/{}", self.main_type, self.sub_type);
        for (k, v) in &self.params {
            out.push_str("; ");
            out.push_str(k);
            out.push('=');
            out.push_str(&super::quote_if_needed(v));
        }
        if self.q != 1000 {
            out.push_str(&format!("; q={}", format_q(self.q)));
        }
        out
    }
}

fn parse_q(s: &str) -> Result<u16, Error> {
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    let whole: u16 = whole.parse().map_err(|_| Error::parse("invalid q-value", 0))?;
    if whole > 1 || frac.len() > 3 {
        return Err(Error::parse("q-value out of range", 0));
    }
    let mut frac_digits = [0u8; 3];
    for (i, c) in frac.bytes().enumerate() {
        if !c.is_ascii_digit() {
            return Err(Error::parse("invalid q-value", 0));
        }
        frac_digits[i] = c - b'0';
    }
    let frac_value = frac_digits[0] as u16 * 100 + frac_digits[1] as u16 * 10 + frac_digits[2] as u16;
    let q = whole * 1000 + frac_value;
    if q > 1000 {
        return Err(Error::parse("q-value out of range", 0));
    }
    Ok(q)
}

fn format_q(q: u16) -> String {
    if q % 1000 == 0 {
        format!("{}", q / 1000)
    } else {
        format!("{}.{:03}", q / 1000, q % 1000).trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_simple_range() {
        let m = MediaRange::parse(b"text/html").unwrap();
        assert_eq!(m.main_type(), "text");
        assert_eq!(m.sub_type(), "html");
        assert_eq!(m.quality(), 1000);
    }

    #[test]
    fn separates_q_from_media_params() {
        let m = MediaRange::parse(b"text/html;charset=utf-8;q=0.7").unwrap();
        assert_eq!(m.param("charset"), Some("utf-8"));
        assert_eq!(m.quality(), 700);
        assert_eq!(m.param("q"), None);
    }

    #[test]
    fn wildcard_matches() {
        let m = MediaRange::parse(b"text/*").unwrap();
        assert!(m.matches("text", "plain"));
        assert!(!m.matches("image", "png"));
    }
}
