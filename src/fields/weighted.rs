//! Weighted list field values using the `q=` quality parameter, e.g.
//! `Accept-Language: en-US;q=0.8, en;q=0.5`.
use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Weighted {
    value: String,
    /// Quality value scaled by 1000 (RFC 9110 allows up to 3 decimal
    /// digits), so `q=0.5` is stored as `500`. Avoids float comparisons
    /// when sorting.
    q: u16,
}

impl Weighted {
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Quality in the 0..=1000 range, where 1000 means `q=1`.
    pub fn quality(&self) -> u16 {
        self.q
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WeightedList {
    items: Vec<Weighted>,
}

impl WeightedList {
    /// Items in descending quality order, ties preserving input order.
    pub fn items(&self) -> &[Weighted] {
        &self.items
    }

    pub fn parse(input: &[u8]) -> Result<Self, Error> {
        let mut items = Vec::new();
        for field in input.split(|&b| b == b',') {
            let field = super::trim(field);
            if field.is_empty() {
                continue;
            }
            let (value, rest) = super::parse_token(field)?;
            let rest = super::trim(rest);
            let q = if rest.is_empty() {
                1000
            } else {
                parse_q_param(rest)?
            };
            items.push(Weighted { value: value.to_string(), q });
        }
        items.sort_by(|a, b| b.q.cmp(&a.q));
        Ok(Self { items })
    }

    pub fn serialize(&self) -> String {
        self.items
            .iter()
            .map(|w| {
                if w.q == 1000 {
                    w.value.clone()
                } else {
                    format!("{};q={}", w.value, format_q(w.q))
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn parse_q_param(input: &[u8]) -> Result<u16, Error> {
    let rest = input.strip_prefix(b";").ok_or_else(|| Error::parse("expected ';q='", 0))?;
    let rest = super::trim(rest);
    let rest = rest
        .strip_prefix(b"q=")
        .or_else(|| rest.strip_prefix(b"Q="))
        .ok_or_else(|| Error::parse("expected 'q=' parameter", 0))?;
    let s = std::str::from_utf8(rest).map_err(|_| Error::parse("non-ASCII q-value", 0))?;
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
    fn sorts_by_descending_quality() {
        let list = WeightedList::parse(b"en;q=0.5, en-US;q=0.8, fr").unwrap();
        let values: Vec<_> = list.items().iter().map(|w| w.value()).collect();
        assert_eq!(values, vec!["fr", "en-US", "en"]);
    }

    #[test]
    fn defaults_to_q_1000_when_absent() {
        let list = WeightedList::parse(b"gzip").unwrap();
        assert_eq!(list.items()[0].quality(), 1000);
    }

    #[test]
    fn rejects_out_of_range_q() {
        assert!(WeightedList::parse(b"a;q=1.5").is_err());
    }

    #[test]
    fn serialize_omits_q_for_full_quality() {
        let list = WeightedList::parse(b"gzip").unwrap();
        assert_eq!(list.serialize(), "gzip");
    }
}
