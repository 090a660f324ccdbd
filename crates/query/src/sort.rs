use core::cmp::Ordering;

use crate::value::total_cmp;
use crate::{Document, FieldPath};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: FieldPath,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: &str) -> Self {
        Self {
            field: FieldPath::new(field),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: FieldPath::new(field),
            direction: SortDirection::Desc,
        }
    }
}

/// Compare two documents key by key, left to right.
pub fn compare_documents(a: &Document, b: &Document, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let ord = total_cmp(key.field.lookup(a), key.field.lookup(b));
        let ord = match key.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn later_keys_break_ties() {
        let a = json!({"housing": true, "name": "B"});
        let b = json!({"housing": true, "name": "A"});
        let keys = [SortKey::desc("housing"), SortKey::asc("name")];
        assert_eq!(
            compare_documents(a.as_object().unwrap(), b.as_object().unwrap(), &keys),
            Ordering::Greater
        );
    }
}
