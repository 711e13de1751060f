//! Per-value classification into a tagged class.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::input::RawValue;
use crate::schema::InferredType;

// =============================================================================
// LAZY STATIC PATTERNS
// =============================================================================
// Accepted date layouts, anchored at both ends, paired with the chrono format
// used to validate the calendar date.

static DATE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"^\d{4}-\d{2}-\d{2}$", "%Y-%m-%d"), // YYYY-MM-DD
        (r"^\d{2}/\d{2}/\d{4}$", "%m/%d/%Y"), // MM/DD/YYYY
        (r"^\d{2}-\d{2}-\d{4}$", "%m-%d-%Y"), // MM-DD-YYYY
    ]
    .into_iter()
    .filter_map(|(pattern, format)| Regex::new(pattern).ok().map(|re| (re, format)))
    .collect()
});

/// Class of a single raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueClass {
    Missing,
    Bool,
    Number,
    Date,
    Text,
}

impl ValueClass {
    /// Classify a value. The first matching rule wins:
    /// missing, boolean, number, date, text.
    pub fn classify(value: &RawValue) -> ValueClass {
        if value.is_missing() {
            return ValueClass::Missing;
        }

        match value {
            RawValue::Null => ValueClass::Missing,
            RawValue::Bool(_) => ValueClass::Bool,
            RawValue::Number(n) if n.is_finite() => ValueClass::Number,
            RawValue::Number(_) => ValueClass::Text,
            RawValue::Text(text) => classify_text(text),
        }
    }

    /// Column type this class votes for. `Missing` votes for nothing.
    pub fn inferred_type(&self) -> Option<InferredType> {
        match self {
            ValueClass::Missing => None,
            ValueClass::Bool => Some(InferredType::Boolean),
            ValueClass::Number => Some(InferredType::Number),
            ValueClass::Date => Some(InferredType::Date),
            ValueClass::Text => Some(InferredType::String),
        }
    }

    /// Class that values of a column type are expected to have.
    pub fn for_type(ty: InferredType) -> ValueClass {
        match ty {
            InferredType::Boolean => ValueClass::Bool,
            InferredType::Number => ValueClass::Number,
            InferredType::Date => ValueClass::Date,
            InferredType::String => ValueClass::Text,
        }
    }
}

fn classify_text(text: &str) -> ValueClass {
    // Case-sensitive on purpose: "True" and "FALSE" are text
    if text == "true" || text == "false" {
        return ValueClass::Bool;
    }

    let trimmed = text.trim();
    if parse_number(trimmed).is_some() {
        return ValueClass::Number;
    }

    if parse_date(trimmed).is_some() {
        return ValueClass::Date;
    }

    ValueClass::Text
}

/// Parse text as a finite number. `NaN` and infinities are not numbers here.
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse text as a calendar date in one of the accepted layouts.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    DATE_PATTERNS
        .iter()
        .filter(|(pattern, _)| pattern.is_match(trimmed))
        .find_map(|(_, format)| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Numeric view of a raw value, if it classifies as a number.
pub fn numeric_value(value: &RawValue) -> Option<f64> {
    match value {
        RawValue::Number(n) if n.is_finite() => Some(*n),
        RawValue::Text(text) if ValueClass::classify(value) == ValueClass::Number => {
            parse_number(text)
        }
        _ => None,
    }
}

/// Date view of a raw value, if it classifies as a date.
pub fn date_value(value: &RawValue) -> Option<NaiveDate> {
    match value {
        RawValue::Text(text) => parse_date(text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(text: &str) -> ValueClass {
        ValueClass::classify(&RawValue::from(text))
    }

    #[test]
    fn test_missing() {
        assert_eq!(class(""), ValueClass::Missing);
        assert_eq!(class("  "), ValueClass::Missing);
        assert_eq!(ValueClass::classify(&RawValue::Null), ValueClass::Missing);
    }

    #[test]
    fn test_boolean_is_case_sensitive() {
        assert_eq!(class("true"), ValueClass::Bool);
        assert_eq!(class("false"), ValueClass::Bool);
        assert_eq!(class("True"), ValueClass::Text);
        assert_eq!(class("yes"), ValueClass::Text);
        assert_eq!(ValueClass::classify(&RawValue::Bool(false)), ValueClass::Bool);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(class("42"), ValueClass::Number);
        assert_eq!(class("-3.5"), ValueClass::Number);
        assert_eq!(class("1e3"), ValueClass::Number);
        assert_eq!(class(" 7 "), ValueClass::Number);
        assert_eq!(class("NaN"), ValueClass::Text);
        assert_eq!(class("inf"), ValueClass::Text);
        assert_eq!(class("1,000"), ValueClass::Text);
        assert_eq!(ValueClass::classify(&RawValue::Number(2.0)), ValueClass::Number);
    }

    #[test]
    fn test_boolean_beats_number() {
        // "1" and "0" are numbers, not booleans
        assert_eq!(class("1"), ValueClass::Number);
        assert_eq!(class("0"), ValueClass::Number);
    }

    #[test]
    fn test_dates() {
        assert_eq!(class("2024-02-29"), ValueClass::Date);
        assert_eq!(class("12/31/2023"), ValueClass::Date);
        assert_eq!(class("01-15-2024"), ValueClass::Date);
    }

    #[test]
    fn test_invalid_calendar_dates_are_text() {
        assert_eq!(class("2023-02-29"), ValueClass::Text);
        assert_eq!(class("13/01/2024"), ValueClass::Text);
        assert_eq!(class("2024-1-5"), ValueClass::Text);
        assert_eq!(class("2024/01/05"), ValueClass::Text);
        assert_eq!(class("2024-01-05T10:00:00"), ValueClass::Text);
    }

    #[test]
    fn test_numeric_value() {
        assert_eq!(numeric_value(&RawValue::from("2.5")), Some(2.5));
        assert_eq!(numeric_value(&RawValue::Number(1.0)), Some(1.0));
        assert_eq!(numeric_value(&RawValue::from("x")), None);
        assert_eq!(numeric_value(&RawValue::from("")), None);
        assert_eq!(numeric_value(&RawValue::Bool(true)), None);
    }
}
