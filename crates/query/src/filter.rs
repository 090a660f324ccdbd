//! Filter conditions and their evaluation against documents.

use core::cmp::Ordering;

use serde_json::Value;

use crate::value::{compare_strings, parse_scalar};
use crate::{Document, FieldPath};

/// Comparison operators clients may use. Anything else is rejected.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl Operator {
    /// Operators addressable by keyword (`field[gt]`, `field_gt`).
    pub const KEYWORDS: [Operator; 5] = [Self::Gt, Self::Gte, Self::Lt, Self::Lte, Self::In];

    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "in" => Some(Self::In),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
        }
    }

    fn accepts(&self, ord: Ordering) -> bool {
        match self {
            Self::Eq | Self::In => ord == Ordering::Equal,
            Self::Gt => ord == Ordering::Greater,
            Self::Gte => ord != Ordering::Less,
            Self::Lt => ord == Ordering::Less,
            Self::Lte => ord != Ordering::Greater,
        }
    }
}

/// A filter operand, kept both as the client sent it and typed.
///
/// String fields are compared against `raw` so that e.g. a zipcode `02118`
/// is not mistaken for the number 2118.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub raw: String,
    pub typed: Value,
}

impl Scalar {
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            typed: parse_scalar(raw),
        }
    }

    pub fn from_value(value: Value) -> Self {
        let raw = match &value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self { raw, typed: value }
    }

    /// Order of the document value relative to this operand, when comparable.
    fn compare(&self, doc_value: &Value) -> Option<Ordering> {
        match (doc_value, &self.typed) {
            (Value::Number(d), Value::Number(s)) => d.as_f64()?.partial_cmp(&s.as_f64()?),
            (Value::String(d), _) => Some(compare_strings(d, &self.raw)),
            (Value::Bool(d), Value::Bool(s)) if d == s => Some(Ordering::Equal),
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: FieldPath,
    pub op: Operator,
    /// One operand for comparisons, one or more for `in`.
    pub values: Vec<Scalar>,
}

impl Condition {
    pub fn matches(&self, doc: &Document) -> bool {
        match self.field.lookup(doc) {
            None => self.op == Operator::Eq && self.values.iter().any(|v| v.typed.is_null()),
            Some(Value::Array(items)) if matches!(self.op, Operator::Eq | Operator::In) => {
                items.iter().any(|item| self.matches_value(item))
            }
            Some(value) => self.matches_value(value),
        }
    }

    fn matches_value(&self, value: &Value) -> bool {
        self.values
            .iter()
            .any(|operand| operand.compare(value).is_some_and(|ord| self.op.accepts(ord)))
    }
}

/// Conjunction of conditions. The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    /// Add an equality condition on a trusted field path.
    pub fn and_eq(mut self, field: &str, value: Value) -> Self {
        self.conditions.push(Condition {
            field: FieldPath::new(field),
            op: Operator::Eq,
            values: vec![Scalar::from_value(value)],
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|c| c.matches(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    fn cond(field: &str, op: Operator, raws: &[&str]) -> Condition {
        Condition {
            field: FieldPath::new(field),
            op,
            values: raws.iter().map(|r| Scalar::parse(r)).collect(),
        }
    }

    #[test]
    fn numeric_ranges() {
        let d = doc(json!({"averageCost": 10000}));
        assert!(cond("averageCost", Operator::Lte, &["10000"]).matches(&d));
        assert!(!cond("averageCost", Operator::Lt, &["10000"]).matches(&d));
        assert!(cond("averageCost", Operator::Gt, &["9999.5"]).matches(&d));
        assert!(cond("averageCost", Operator::Gte, &["10000"]).matches(&d));
    }

    #[test]
    fn range_on_mismatched_types_never_matches() {
        let d = doc(json!({"averageCost": 10000, "housing": true}));
        assert!(!cond("averageCost", Operator::Gt, &["cheap"]).matches(&d));
        assert!(!cond("housing", Operator::Gt, &["false"]).matches(&d));
    }

    #[test]
    fn string_fields_compare_against_raw_text() {
        let d = doc(json!({"location": {"zipcode": "02118"}}));
        assert!(cond("location.zipcode", Operator::Eq, &["02118"]).matches(&d));
        assert!(!cond("location.zipcode", Operator::Eq, &["2118"]).matches(&d));
    }

    #[test]
    fn in_matches_any_value_and_array_elements() {
        let d = doc(json!({"careers": ["Business", "UI/UX"]}));
        assert!(cond("careers", Operator::In, &["Data Science", "Business"]).matches(&d));
        assert!(cond("careers", Operator::Eq, &["UI/UX"]).matches(&d));
        assert!(!cond("careers", Operator::In, &["Other"]).matches(&d));
    }

    #[test]
    fn booleans_and_missing_fields() {
        let d = doc(json!({"housing": true}));
        assert!(cond("housing", Operator::Eq, &["true"]).matches(&d));
        assert!(!cond("housing", Operator::Eq, &["false"]).matches(&d));
        assert!(cond("averageCost", Operator::Eq, &["null"]).matches(&d));
        assert!(!cond("averageCost", Operator::Gt, &["1"]).matches(&d));
    }

    #[test]
    fn timestamp_ranges_are_chronological() {
        let d = doc(json!({"createdAt": "2024-03-01T10:00:00Z"}));
        assert!(cond("createdAt", Operator::Gt, &["2024-02-29T23:59:59.999+00:00"]).matches(&d));
        assert!(cond("createdAt", Operator::Lt, &["2024-03-01T10:00:00.5Z"]).matches(&d));
    }

    #[test]
    fn filter_is_a_conjunction() {
        let d = doc(json!({"housing": true, "averageCost": 5000}));
        let f = Filter::new()
            .and_eq("housing", json!(true))
            .and_eq("averageCost", json!(5000));
        assert!(f.matches(&d));
        let f = f.and_eq("averageCost", json!(6000));
        assert!(!f.matches(&d));
        assert!(Filter::new().matches(&d));
    }
}
