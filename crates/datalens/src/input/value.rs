//! Untyped cell values as they come out of the parsers.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single raw cell value.
///
/// Parsers never coerce: CSV cells are always `Text`, JSON and XLSX keep
/// whatever scalar type the source carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

/// One record keyed by column name, in column order.
pub type RawRow = IndexMap<String, RawValue>;

impl RawValue {
    /// Shared placeholder for absent cells.
    pub const NULL: RawValue = RawValue::Null;

    /// Whether this value counts as missing.
    ///
    /// Missing means `null`, blank or whitespace-only text, or the literal
    /// strings `null` / `undefined` left behind by upstream serializers.
    pub fn is_missing(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Text(s) => {
                let trimmed = s.trim();
                trimmed.is_empty() || trimmed == "null" || trimmed == "undefined"
            }
            RawValue::Bool(_) | RawValue::Number(_) => false,
        }
    }

    /// Identity used for cardinality and frequency counting.
    pub fn key(&self) -> ValueKey {
        match self {
            RawValue::Null => ValueKey::Null,
            RawValue::Bool(b) => ValueKey::Bool(*b),
            // -0.0 and 0.0 are the same value
            RawValue::Number(n) if *n == 0.0 => ValueKey::Number(0.0f64.to_bits()),
            RawValue::Number(n) => ValueKey::Number(n.to_bits()),
            RawValue::Text(s) => ValueKey::Text(s.clone()),
        }
    }
}

/// Hashable identity of a raw value.
///
/// Values of different kinds stay distinct even when they print alike, so
/// the number `1` and the string `"1"` are two values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Null,
    Bool(bool),
    Number(u64),
    Text(String),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => f.write_str("null"),
            RawValue::Bool(b) => write!(f, "{}", b),
            RawValue::Number(n) => {
                // Integral values print without a trailing ".0"
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

/// Convert a JSON value into a raw cell.
///
/// Nested arrays and objects are kept as their compact JSON text.
impl From<&serde_json::Value> for RawValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Null,
            serde_json::Value::Bool(b) => RawValue::Bool(*b),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => RawValue::Number(f),
                None => RawValue::Text(n.to_string()),
            },
            serde_json::Value::String(s) => RawValue::Text(s.clone()),
            other => RawValue::Text(other.to_string()),
        }
    }
}
