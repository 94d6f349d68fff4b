//! Ordered, case-insensitive header map.
//!
//! HTTP header names compare case-insensitively, but the casing a caller
//! used first is what ends up on the wire. Entries keep their insertion
//! order so serialized output is deterministic.

/// An ordered map of header names to values.
///
/// Lookups compare names ASCII-case-insensitively. Overwriting a header
/// keeps the original casing of the first insertion and its position in
/// the map; only the value changes (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a header.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove a header, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self
            .entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        Some(self.entries.remove(idx).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.set("Content-Type", "text/plain");
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert!(headers.contains("Content-type"));
    }

    #[test]
    fn overwrite_keeps_first_casing_and_position() {
        let mut headers = HeaderMap::new();
        headers.set("Content-Type", "text/plain");
        headers.set("X-Extra", "1");
        headers.set("content-type", "application/json");

        assert_eq!(headers.len(), 2);
        let entries: Vec<_> = headers.iter().collect();
        assert_eq!(entries[0], ("Content-Type", "application/json"));
        assert_eq!(entries[1], ("X-Extra", "1"));
    }

    #[test]
    fn remove_and_clear() {
        let mut headers = HeaderMap::new();
        headers.set("A", "1");
        headers.set("B", "2");
        assert_eq!(headers.remove("a"), Some("1".to_string()));
        assert_eq!(headers.remove("a"), None);
        headers.clear();
        assert!(headers.is_empty());
    }
}
