//! Dataset-level schema definition.

use serde::{Deserialize, Serialize};

use super::column::ColumnSchema;
use super::types::InferredType;

/// Schema for an entire dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSchema {
    /// Column schemas in first-observed order.
    pub columns: Vec<ColumnSchema>,
    /// Number of data rows.
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
}

impl DatasetSchema {
    /// Create a schema from column schemas and a row count.
    pub fn new(columns: Vec<ColumnSchema>, row_count: usize) -> Self {
        let column_count = columns.len();
        Self {
            columns,
            row_count,
            column_count,
        }
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get all column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Columns inferred as a given type, in schema order.
    pub fn columns_of_type(&self, ty: InferredType) -> impl Iterator<Item = &ColumnSchema> {
        self.columns.iter().filter(move |c| c.inferred_type == ty)
    }

    /// Total number of missing cells.
    pub fn total_null_count(&self) -> usize {
        self.columns.iter().map(|c| c.null_count).sum()
    }
}
