//! Core type definitions for schema representation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Inferred data type for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferredType {
    /// Finite numbers, integral or not.
    Number,
    /// `true` / `false`.
    Boolean,
    /// Calendar dates in one of the accepted patterns.
    Date,
    /// Anything else, and the fallback for mixed columns.
    String,
}

impl InferredType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, InferredType::Number)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InferredType::Number => "number",
            InferredType::Boolean => "boolean",
            InferredType::Date => "date",
            InferredType::String => "string",
        }
    }
}

impl Default for InferredType {
    fn default() -> Self {
        InferredType::String
    }
}

impl fmt::Display for InferredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
