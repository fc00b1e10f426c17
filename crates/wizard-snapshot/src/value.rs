//! Field value helpers
//!
//! Form inputs hand numbers over as strings more often than not, so numeric
//! reads coerce: a decimal comma becomes a dot and the empty string reads as
//! zero.

use serde_json::{Number, Value};

/// Read a field value as a number
///
/// Returns `None` for `null`, booleans, collections and unparseable text.
#[must_use]
pub fn read_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Some(0.0);
            }
            trimmed
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
        }
        _ => None,
    }
}

/// Encode a number as a field value
///
/// Integral values are written as JSON integers so `30` never becomes `30.0`.
#[must_use]
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        #[allow(clippy::cast_possible_truncation)]
        return Value::from(n as i64);
    }
    Number::from_f64(n).map_or(Value::Null, Value::Number)
}

/// Whether a value counts as "not filled in"
#[must_use]
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Whether a (multi-select) value contains the given option
#[must_use]
pub fn contains_option(value: &Value, option: &str) -> bool {
    match value {
        Value::Array(items) => items.iter().any(|v| v.as_str() == Some(option)),
        Value::String(s) => s == option,
        _ => false,
    }
}
