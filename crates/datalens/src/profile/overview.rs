//! Dataset-level overview section.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::input::{RawRow, RawValue, ValueKey};
use crate::schema::{DatasetSchema, InferredType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub row_count: usize,
    pub column_count: usize,
    pub column_types: IndexMap<String, InferredType>,
    pub missing_cells: usize,
    /// Missing cells / (rows × columns), as a fraction. 0 for an empty grid.
    pub missing_ratio: f64,
    /// Rows identical to an earlier row across every schema column.
    pub duplicate_row_count: usize,
}

pub fn compute(rows: &[RawRow], schema: &DatasetSchema) -> Overview {
    let column_types = schema
        .columns
        .iter()
        .map(|c| (c.name.clone(), c.inferred_type))
        .collect();

    let missing_cells = schema.total_null_count();
    let cells = rows.len() * schema.column_count;
    let missing_ratio = if cells == 0 {
        0.0
    } else {
        missing_cells as f64 / cells as f64
    };

    Overview {
        row_count: rows.len(),
        column_count: schema.column_count,
        column_types,
        missing_cells,
        missing_ratio,
        duplicate_row_count: duplicate_rows(rows, schema),
    }
}

fn duplicate_rows(rows: &[RawRow], schema: &DatasetSchema) -> usize {
    let mut seen: HashSet<Vec<Option<ValueKey>>> = HashSet::with_capacity(rows.len());
    rows.iter()
        .filter(|row| {
            let key: Vec<Option<ValueKey>> = schema
                .columns
                .iter()
                .map(|c| {
                    let value = row.get(&c.name).unwrap_or(&RawValue::NULL);
                    // All spellings of missing compare equal
                    (!value.is_missing()).then(|| value.key())
                })
                .collect();
            !seen.insert(key)
        })
        .count()
}
