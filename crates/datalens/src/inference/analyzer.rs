//! Per-column schema inference over parsed records.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::input::{RawRow, RawValue, ValueKey};
use crate::schema::{ColumnSchema, DatasetSchema, InferredType};

use super::classifier::ValueClass;
use super::round2;

/// A column takes its majority class only when that class covers strictly
/// more than this share of the non-missing values; otherwise it is `string`.
pub const MAJORITY_THRESHOLD: f64 = 0.8;

/// Maximum number of example values kept per column.
pub const SAMPLE_VALUE_LIMIT: usize = 5;

/// Infers column types, null and cardinality accounting.
///
/// Inference never fails: ambiguous or empty columns degrade to `string`.
#[derive(Debug, Clone, Default)]
pub struct SchemaInferrer;

impl SchemaInferrer {
    /// Create a new inferrer.
    pub fn new() -> Self {
        Self
    }

    /// Infer the schema of a dataset.
    pub fn infer(&self, columns: &[String], rows: &[RawRow]) -> DatasetSchema {
        let schemas: Vec<ColumnSchema> = columns
            .iter()
            .map(|name| self.infer_column(name, rows))
            .collect();

        debug!(
            columns = schemas.len(),
            rows = rows.len(),
            "inferred schema"
        );

        DatasetSchema::new(schemas, rows.len())
    }

    /// Infer one column.
    pub fn infer_column(&self, name: &str, rows: &[RawRow]) -> ColumnSchema {
        let row_count = rows.len();

        let mut null_count = 0usize;
        let mut class_counts: BTreeMap<ValueClass, usize> = BTreeMap::new();
        let mut seen: HashSet<ValueKey> = HashSet::new();
        let mut sample_values: Vec<RawValue> = Vec::new();

        for row in rows {
            let value = row.get(name).unwrap_or(&RawValue::NULL);
            let class = ValueClass::classify(value);

            if class == ValueClass::Missing {
                null_count += 1;
                continue;
            }

            *class_counts.entry(class).or_insert(0) += 1;

            if seen.insert(value.key()) && sample_values.len() < SAMPLE_VALUE_LIMIT {
                sample_values.push(value.clone());
            }
        }

        let non_null = row_count - null_count;
        let inferred_type = majority_type(&class_counts, non_null);

        let matching = class_counts
            .get(&ValueClass::for_type(inferred_type))
            .copied()
            .unwrap_or(0);
        let type_consistency = if non_null == 0 {
            1.0
        } else {
            matching as f64 / non_null as f64
        };

        let cardinality = seen.len();

        ColumnSchema {
            name: name.to_string(),
            inferred_type,
            nullable: null_count > 0,
            null_count,
            null_ratio: percentage(null_count, row_count),
            cardinality,
            unique_ratio: percentage(cardinality, non_null.max(1)),
            sample_values,
            type_consistency,
        }
    }
}

/// Majority class, if it clears [`MAJORITY_THRESHOLD`]; `string` otherwise.
fn majority_type(class_counts: &BTreeMap<ValueClass, usize>, non_null: usize) -> InferredType {
    if non_null == 0 {
        return InferredType::String;
    }

    // BTreeMap iteration keeps tie-breaking deterministic
    let best = class_counts
        .iter()
        .fold(None, |best: Option<(ValueClass, usize)>, (&class, &count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((class, count)),
        });

    match best {
        Some((class, count)) if count as f64 / non_null as f64 > MAJORITY_THRESHOLD => {
            class.inferred_type().unwrap_or(InferredType::String)
        }
        _ => InferredType::String,
    }
}

/// `part / whole` as a percentage, rounded to 2 dp. Zero when `whole` is zero.
fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(part as f64 / whole as f64 * 100.0)
    }
}
