//! Dotted field paths (`location.city`).

use serde_json::Value;

use crate::{Document, QueryError};

/// Deepest path accepted from clients.
pub const MAX_DEPTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Parse a client-supplied path.
    ///
    /// Each segment must start with an ASCII letter followed by letters, digits
    /// or `_`; at most [`MAX_DEPTH`] segments.
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.len() > MAX_DEPTH {
            return Err(QueryError::TooDeep(raw.to_string()));
        }
        for seg in &segments {
            let mut chars = seg.chars();
            let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(QueryError::InvalidFieldName(raw.to_string()));
            }
        }
        Ok(Self(segments))
    }

    /// Trusted, internally-constructed path. No validation.
    pub fn new(path: &str) -> Self {
        Self(path.split('.').map(str::to_string).collect())
    }

    pub fn root(&self) -> &str {
        &self.0[0]
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Resolve the path inside a document.
    pub fn lookup<'a>(&self, doc: &'a Document) -> Option<&'a Value> {
        let (first, rest) = self.0.split_first()?;
        let mut current = doc.get(first)?;
        for seg in rest {
            current = current.as_object()?.get(seg)?;
        }
        Some(current)
    }
}

impl core::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_operator_like_and_malformed_names() {
        for bad in ["$where", "", "a..b", "1abc", "name$gt", "a b"] {
            assert!(FieldPath::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn rejects_paths_deeper_than_limit() {
        assert_eq!(
            FieldPath::parse("a.b.c.d"),
            Err(QueryError::TooDeep("a.b.c.d".to_string()))
        );
        assert!(FieldPath::parse("a.b.c").is_ok());
    }

    #[test]
    fn looks_up_nested_values() {
        let doc = json!({"location": {"city": "Boston"}, "name": "Devworks"});
        let doc = doc.as_object().unwrap();
        assert_eq!(FieldPath::new("location.city").lookup(doc), Some(&json!("Boston")));
        assert_eq!(FieldPath::new("location.zip").lookup(doc), None);
        assert_eq!(FieldPath::new("name.first").lookup(doc), None);
    }
}
