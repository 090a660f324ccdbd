//! Value typing and ordering rules shared by filters and sorts.

use core::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use serde_json::{Number, Value};

/// Interpret a raw query-string value: `true`/`false`, `null`, numbers,
/// otherwise the string itself.
pub fn parse_scalar(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => match raw.parse::<f64>() {
            Ok(n) if n.is_finite() && looks_numeric(raw) => number_value(n),
            _ => Value::String(raw.to_string()),
        },
    }
}

// `f64::from_str` also accepts "inf", "NaN" and "1e5"; only plain decimals count.
fn looks_numeric(raw: &str) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|c| *c == '.').count() <= 1
        && digits.chars().any(|c| c.is_ascii_digit())
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

/// Compare two strings, chronologically when both are RFC 3339 timestamps.
pub fn compare_strings(a: &str, b: &str) -> Ordering {
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Some(ta), Some(tb)) => ta.cmp(&tb),
        _ => a.cmp(b),
    }
}

fn type_rank(v: Option<&Value>) -> u8 {
    match v {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

/// Total order over optional JSON values used for sorting.
///
/// Missing and `null` sort first, then booleans, numbers, strings, arrays and
/// objects. Arrays and objects of the same type compare equal.
pub fn total_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => compare_strings(x, y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
