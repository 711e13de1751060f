//! Column schema definition.

use serde::{Deserialize, Serialize};

use crate::input::RawValue;

use super::types::InferredType;

/// Schema for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSchema {
    /// Column name.
    pub name: String,
    /// Inferred data type.
    pub inferred_type: InferredType,
    /// Whether missing values are present.
    pub nullable: bool,
    /// Number of missing cells.
    pub null_count: usize,
    /// Missing cells as a percentage of all rows (2 dp).
    pub null_ratio: f64,
    /// Number of distinct non-missing values.
    pub cardinality: usize,
    /// Cardinality as a percentage of non-missing values (2 dp).
    pub unique_ratio: f64,
    /// Up to five distinct values in first-seen order.
    pub sample_values: Vec<RawValue>,
    /// Share of non-missing values whose class matches `inferred_type` (0.0-1.0).
    pub type_consistency: f64,
}

impl ColumnSchema {
    /// Create an empty column schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inferred_type: InferredType::String,
            nullable: false,
            null_count: 0,
            null_ratio: 0.0,
            cardinality: 0,
            unique_ratio: 0.0,
            sample_values: Vec::new(),
            type_consistency: 1.0,
        }
    }

    /// Number of non-missing cells, given the dataset row count.
    pub fn non_null_count(&self, row_count: usize) -> usize {
        row_count.saturating_sub(self.null_count)
    }

    /// Whether every cell of the column is missing.
    pub fn is_empty(&self, row_count: usize) -> bool {
        self.non_null_count(row_count) == 0
    }
}
