//! Schema inference: value classification and per-column accounting.

mod analyzer;
mod classifier;

pub use analyzer::{SchemaInferrer, MAJORITY_THRESHOLD, SAMPLE_VALUE_LIMIT};
pub use classifier::{date_value, numeric_value, parse_date, parse_number, ValueClass};

/// Round to 2 decimal places, half away from zero.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
