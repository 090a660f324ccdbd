//! Per-collection field rules.

use crate::ID_FIELD;

/// Declares which fields of a collection clients may query, which must never
/// leave the store, and which field combinations are unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub collection: &'static str,
    /// Top-level fields usable in filters, `select` and `sort`.
    /// The identity field is always allowed.
    pub fields: &'static [&'static str],
    /// Fields stripped from every response and rejected in queries.
    pub hidden: &'static [&'static str],
    /// Each entry is a set of fields whose combined values must be unique.
    pub unique: &'static [&'static [&'static str]],
}

impl Schema {
    pub fn is_hidden(&self, root: &str) -> bool {
        self.hidden.contains(&root)
    }

    /// Whether `root` (the first segment of a field path) may be queried.
    pub fn is_queryable(&self, root: &str) -> bool {
        if self.is_hidden(root) {
            return false;
        }
        root == ID_FIELD || self.fields.contains(&root)
    }
}
