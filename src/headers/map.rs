//! An ordered, case-insensitive header multimap.
use crate::headers::name::AsHeaderName;
use crate::headers::{HeaderName, HeaderValue};

/// HTTP headers, preserving insertion order and allowing duplicate names
/// (e.g. repeated `Set-Cookie`).
///
/// Backed by a plain `Vec` rather than a hash table: header counts per
/// message are small enough that linear scans are cheap and avoid
/// exposing a hashing algorithm with no HashDoS resistance.
#[derive(Clone, Debug, Default)]
pub struct HeaderMap {
    entries: Vec<(HeaderName, HeaderValue)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity) }
    }

    /// Total number of header fields, counting duplicates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.entries.iter().map(|(n, v)| (n, v))
    }

    pub fn contains_key<K: AsHeaderName>(&self, name: K) -> bool {
        self.entries.iter().any(|(n, _)| name.matches(n))
    }

    /// The first value for `name`, in insertion order.
    pub fn get<K: AsHeaderName>(&self, name: K) -> Option<&HeaderValue> {
        self.entries.iter().find(|(n, _)| name.matches(n)).map(|(_, v)| v)
    }

    /// All values for `name`, in insertion order.
    pub fn get_all<K: AsHeaderName>(&self, name: K) -> impl Iterator<Item = &HeaderValue> {
        self.entries.iter().filter(move |(n, _)| name.matches(n)).map(|(_, v)| v)
    }

    /// Remove every existing value for `name` and insert `value`,
    /// returning the first previously-held value if any.
    pub fn insert(&mut self, name: HeaderName, value: HeaderValue) -> Option<HeaderValue> {
        let mut previous = None;
        self.entries.retain(|(n, v)| {
            if *n == name {
                if previous.is_none() {
                    previous = Some(v.clone());
                }
                false
            } else {
                true
            }
        });
        self.entries.push((name, value));
        previous
    }

    /// Add `value` for `name` without disturbing any existing values.
    pub fn append(&mut self, name: HeaderName, value: HeaderValue) {
        self.entries.push((name, value));
    }

    /// Replace the most recently inserted entry's value in place. Used
    /// when collapsing an obsolete line-folded continuation onto the
    /// header it continues.
    pub(crate) fn replace_last_value(&mut self, value: HeaderValue) {
        if let Some(last) = self.entries.last_mut() {
            last.1 = value;
        }
    }

    /// Remove every value for `name`, returning the first one if any.
    pub fn remove<K: AsHeaderName>(&mut self, name: K) -> Option<HeaderValue> {
        let mut removed = None;
        self.entries.retain(|(n, v)| {
            if name.matches(n) {
                if removed.is_none() {
                    removed = Some(v.clone());
                }
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a> IntoIterator for &'a HeaderMap {
    type Item = (&'a HeaderName, &'a HeaderValue);
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::headers::name;

    #[test]
    fn insert_replaces_all_prior_values() {
        let mut map = HeaderMap::new();
        map.append(name::accept(), HeaderValue::from_static("a"));
        map.append(name::accept(), HeaderValue::from_static("b"));
        map.insert(name::accept(), HeaderValue::from_static("c"));
        assert_eq!(map.get_all(name::accept()).count(), 1);
        assert_eq!(map.get(name::accept()).unwrap().to_str().unwrap(), "c");
    }

    #[test]
    fn append_preserves_duplicates_in_order() {
        let mut map = HeaderMap::new();
        map.append(name::set_cookie(), HeaderValue::from_static("a=1"));
        map.append(name::set_cookie(), HeaderValue::from_static("b=2"));
        let values: Vec<_> = map.get_all(name::set_cookie()).map(|v| v.to_str().unwrap()).collect();
        assert_eq!(values, vec!["a=1", "b=2"]);
    }

    #[test]
    fn lookup_by_str_is_case_insensitive() {
        let mut map = HeaderMap::new();
        map.append(name::content_length(), HeaderValue::from_static("5"));
        assert!(map.contains_key("Content-Length"));
    }

    #[test]
    fn remove_drops_all_values() {
        let mut map = HeaderMap::new();
        map.append(name::accept(), HeaderValue::from_static("a"));
        map.append(name::accept(), HeaderValue::from_static("b"));
        map.remove(name::accept());
        assert!(!map.contains_key(name::accept()));
    }
}
