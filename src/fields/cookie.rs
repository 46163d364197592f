//! `Cookie` and `Set-Cookie` field values, per RFC 6265.
use crate::error::Error;

fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

/// A request `Cookie` header: a `;`-separated list of `name=value` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cookie {
    pairs: Vec<(String, String)>,
}

impl Cookie {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn parse(input: &[u8]) -> Result<Self, Error> {
        let mut pairs = Vec::new();
        for part in input.split(|&b| b == b';') {
            let part = super::trim(part);
            if part.is_empty() {
                continue;
            }
            let eq = part.iter().position(|&b| b == b'=').ok_or_else(|| Error::parse("expected '=' in cookie pair", 0))?;
            let name = std::str::from_utf8(&part[..eq]).map_err(|_| Error::parse("non-ASCII cookie name", 0))?;
            let mut value = &part[eq + 1..];
            if value.first() == Some(&b'"') && value.last() == Some(&b'"') && value.len() >= 2 {
                value = &value[1..value.len() - 1];
            }
            if !value.iter().all(|&b| is_cookie_octet(b)) {
                return Err(Error::parse("invalid cookie-octet", 0));
            }
            let value = std::str::from_utf8(value).map_err(|_| Error::parse("non-ASCII cookie value", 0))?;
            pairs.push((name.to_string(), value.to_string()));
        }
        Ok(Self { pairs })
    }

    pub fn serialize(&self) -> String {
        self.pairs.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("; ")
    }
}

/// `SameSite` attribute values, per the cookie-prefixes draft folded
/// into RFC 6265bis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

/// A response `Set-Cookie` header: one `name=value` pair plus attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    name: String,
    value: String,
    max_age: Option<i64>,
    domain: Option<String>,
    path: Option<String>,
    secure: bool,
    http_only: bool,
    same_site: Option<SameSite>,
}

impl SetCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            max_age: None,
            domain: None,
            path: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn max_age(&self) -> Option<i64> {
        self.max_age
    }

    pub fn with_max_age(mut self, secs: i64) -> Self {
        self.max_age = Some(secs);
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn with_http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    pub fn parse(input: &[u8]) -> Result<Self, Error> {
        let mut parts = input.split(|&b| b == b';');
        let first = parts.next().ok_or_else(|| Error::parse("empty Set-Cookie", 0))?;
        let first = super::trim(first);
        let eq = first.iter().position(|&b| b == b'=').ok_or_else(|| Error::parse("expected '=' in Set-Cookie", 0))?;
        let name = std::str::from_utf8(&first[..eq]).map_err(|_| Error::parse("non-ASCII cookie name", 0))?;
        let value = std::str::from_utf8(&first[eq + 1..]).map_err(|_| Error::parse("non-ASCII cookie value", 0))?;
        let mut cookie = SetCookie::new(name, value);

        for attr in parts {
            let attr = super::trim(attr);
            if attr.is_empty() {
                continue;
            }
            let (key, val) = match attr.iter().position(|&b| b == b'=') {
                Some(i) => (&attr[..i], Some(&attr[i + 1..])),
                None => (attr, None),
            };
            let key = std::str::from_utf8(key).map_err(|_| Error::parse("non-ASCII attribute", 0))?;
            match (key.to_ascii_lowercase().as_str(), val) {
                ("max-age", Some(v)) => {
                    let v = std::str::from_utf8(v).map_err(|_| Error::parse("non-ASCII Max-Age", 0))?;
                    cookie.max_age = Some(v.parse().map_err(|_| Error::parse("invalid Max-Age", 0))?);
                }
                ("domain", Some(v)) => {
                    cookie.domain = Some(
                        std::str::from_utf8(v).map_err(|_| Error::parse("non-ASCII Domain", 0))?.to_string(),
                    );
                }
                ("path", Some(v)) => {
                    cookie.path = Some(
                        std::str::from_utf8(v).map_err(|_| Error::parse("non-ASCII Path", 0))?.to_string(),
                    );
                }
                ("secure", None) => cookie.secure = true,
                ("httponly", None) => cookie.http_only = true,
                ("samesite", Some(v)) => {
                    let v = std::str::from_utf8(v).map_err(|_| Error::parse("non-ASCII SameSite", 0))?;
                    cookie.same_site = Some(match v.to_ascii_lowercase().as_str() {
                        "strict" => SameSite::Strict,
                        "lax" => SameSite::Lax,
                        "none" => SameSite::None,
                        _ => return Err(Error::parse("invalid SameSite value", 0)),
                    });
                }
                _ => return Err(Error::parse("unrecognized Set-Cookie attribute", 0)),
            }
        }
        Ok(cookie)
    }

    pub fn serialize(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(max_age) = self.max_age {
            out.push_str(&format!("; Max-Age={max_age}"));
        }
        if let Some(domain) = &self.domain {
            out.push_str(&format!("; Domain={domain}"));
        }
        if let Some(path) = &self.path {
            out.push_str(&format!("; Path={path}"));
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if let Some(same_site) = self.same_site {
            out.push_str("; SameSite=");
            out.push_str(match same_site {
                SameSite::Strict => "Strict",
                SameSite::Lax => "Lax",
                SameSite::None => "None",
            });
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_multiple_cookie_pairs() {
        let c = Cookie::parse(b"a=1; b=2").unwrap();
        assert_eq!(c.get("a"), Some("1"));
        assert_eq!(c.get("b"), Some("2"));
    }

    #[test]
    fn strips_dquote_wrapped_value() {
        let c = Cookie::parse(br#"a="quoted""#).unwrap();
        assert_eq!(c.get("a"), Some("quoted"));
    }

    #[test]
    fn rejects_invalid_cookie_octet() {
        assert!(Cookie::parse(b"a=has space").is_err());
    }

    #[test]
    fn parses_set_cookie_attributes() {
        let sc = SetCookie::parse(b"sid=abc123; Path=/; HttpOnly; SameSite=Lax").unwrap();
        assert_eq!(sc.name(), "sid");
        assert_eq!(sc.value(), "abc123");
        assert!(sc.http_only);
        assert_eq!(sc.same_site, Some(SameSite::Lax));
    }

    #[test]
    fn serializes_set_cookie() {
        let sc = SetCookie::new("sid", "abc").with_secure().with_http_only();
        assert_eq!(sc.serialize(), "sid=abc; Secure; HttpOnly");
    }
}
