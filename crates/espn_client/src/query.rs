//! Ordered query parameters.

use std::fmt;

/// Query string parameters, kept in insertion order so the same logical
/// request always serializes (and therefore caches) the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.pairs.push((key.into(), value.to_string()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// `k=v&k=v`, or empty when there are no parameters.
    pub fn serialize(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// The URL with this query appended, for logs and error messages.
    pub fn full_url(&self, url: &str) -> String {
        if self.is_empty() {
            url.to_string()
        } else {
            format!("{}?{}", url, self.serialize())
        }
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_keeps_insertion_order() {
        let params = QueryParams::new()
            .with("lang", "en")
            .with("limit", 300)
            .with("dates", "20200105");
        assert_eq!(params.serialize(), "lang=en&limit=300&dates=20200105");
        assert_eq!(params.get("limit"), Some("300"));
        assert_eq!(params.get("groups"), None);
    }

    #[test]
    fn test_full_url() {
        let empty = QueryParams::new();
        assert_eq!(empty.full_url("https://x.test/a"), "https://x.test/a");

        let params = QueryParams::new().with("week", 3);
        assert_eq!(params.full_url("https://x.test/a"), "https://x.test/a?week=3");
    }
}
