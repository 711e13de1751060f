//! Composite quality score and remediation hints.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::inference::round2;
use crate::schema::{ColumnSchema, DatasetSchema};

use super::config::ProfileConfig;
use super::outliers::ColumnOutliers;
use super::overview::Overview;

static ID_NAME_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)(^id$|_id$|^id_|uuid|guid)").ok());

const COMPLETENESS_WEIGHT: f64 = 0.5;
const UNIQUENESS_WEIGHT: f64 = 0.3;
const CONSISTENCY_WEIGHT: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualitySummary {
    /// Composite score in [0, 100], 2 dp.
    pub score: f64,
    /// `1 - missingRatio`.
    pub completeness: f64,
    pub uniqueness: f64,
    pub type_consistency: f64,
    pub id_like_columns: Vec<String>,
    pub hints: Vec<QualityHint>,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityHint {
    /// `None` for dataset-wide hints.
    pub column: Option<String>,
    pub kind: HintKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    MissingValues,
    EmptyColumn,
    ConstantColumn,
    MixedTypes,
    DuplicateIds,
    DuplicateRows,
    Outliers,
}

/// Whether a column looks like an identifier, by name or by uniqueness.
pub fn is_id_like(column: &ColumnSchema, row_count: usize, unique_threshold: f64) -> bool {
    if column.non_null_count(row_count) < 2 {
        return false;
    }
    has_id_name(&column.name) || column.unique_ratio >= unique_threshold
}

fn has_id_name(name: &str) -> bool {
    ID_NAME_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(name))
}

pub fn compute(
    schema: &DatasetSchema,
    overview: &Overview,
    outliers: &IndexMap<String, ColumnOutliers>,
    config: &ProfileConfig,
) -> QualitySummary {
    let row_count = schema.row_count;
    let completeness = 1.0 - overview.missing_ratio;

    let id_like: Vec<&ColumnSchema> = schema
        .columns
        .iter()
        .filter(|c| is_id_like(c, row_count, config.id_like_unique_threshold))
        .collect();

    let uniqueness = if !id_like.is_empty() {
        id_like.iter().map(|c| c.unique_ratio / 100.0).sum::<f64>() / id_like.len() as f64
    } else if row_count == 0 {
        1.0
    } else {
        1.0 - overview.duplicate_row_count as f64 / row_count as f64
    };

    let populated: Vec<f64> = schema
        .columns
        .iter()
        .filter(|c| c.non_null_count(row_count) > 0)
        .map(|c| c.type_consistency)
        .collect();
    let type_consistency = if populated.is_empty() {
        1.0
    } else {
        populated.iter().sum::<f64>() / populated.len() as f64
    };

    let raw = 100.0
        * (COMPLETENESS_WEIGHT * completeness
            + UNIQUENESS_WEIGHT * uniqueness
            + CONSISTENCY_WEIGHT * type_consistency);
    let score = round2(raw.clamp(0.0, 100.0));

    let hints = collect_hints(schema, overview, outliers, config);
    let recommendation = recommendation(score, hints.len());

    QualitySummary {
        score,
        completeness,
        uniqueness,
        type_consistency,
        id_like_columns: id_like.iter().map(|c| c.name.clone()).collect(),
        hints,
        recommendation,
    }
}

fn collect_hints(
    schema: &DatasetSchema,
    overview: &Overview,
    outliers: &IndexMap<String, ColumnOutliers>,
    config: &ProfileConfig,
) -> Vec<QualityHint> {
    let row_count = schema.row_count;
    let mut hints = Vec::new();
    let mut hint = |column: Option<&str>, kind: HintKind, message: String| {
        hints.push(QualityHint {
            column: column.map(str::to_string),
            kind,
            message,
        })
    };

    for column in &schema.columns {
        let name = column.name.as_str();
        let non_null = column.non_null_count(row_count);

        if row_count > 0 && non_null == 0 {
            hint(
                Some(name),
                HintKind::EmptyColumn,
                format!("column {} is entirely empty; consider dropping it", name),
            );
            continue;
        }

        if column.null_ratio >= config.missing_hint_threshold && column.null_count > 0 {
            hint(
                Some(name),
                HintKind::MissingValues,
                format!("column {} is {}% missing", name, column.null_ratio),
            );
        }

        if column.cardinality == 1 && non_null >= 2 {
            hint(
                Some(name),
                HintKind::ConstantColumn,
                format!("column {} has a single distinct value", name),
            );
        }

        if column.type_consistency < 1.0 {
            hint(
                Some(name),
                HintKind::MixedTypes,
                format!(
                    "column {} mixes types: only {}% of values are {}",
                    name,
                    round2(column.type_consistency * 100.0),
                    column.inferred_type
                ),
            );
        }

        if has_id_name(name) && non_null >= 2 && column.cardinality < non_null {
            hint(
                Some(name),
                HintKind::DuplicateIds,
                format!(
                    "column {} looks like an identifier but has {} repeated values",
                    name,
                    non_null - column.cardinality
                ),
            );
        }

        if let Some(found) = outliers.get(name) {
            if found.count > 0 && found.percentage >= config.outlier_hint_threshold {
                hint(
                    Some(name),
                    HintKind::Outliers,
                    format!("column {} has {}% outliers", name, found.percentage),
                );
            }
        }
    }

    if overview.duplicate_row_count > 0 {
        hint(
            None,
            HintKind::DuplicateRows,
            format!("{} duplicate rows found", overview.duplicate_row_count),
        );
    }

    hints
}

fn recommendation(score: f64, hint_count: usize) -> String {
    if score >= 90.0 && hint_count == 0 {
        "Data quality is good. Ready for analysis.".to_string()
    } else if score >= 90.0 {
        format!("Data quality is good. {} minor issues to review.", hint_count)
    } else if score >= 70.0 {
        "Data quality is acceptable. Consider addressing the hints.".to_string()
    } else {
        format!(
            "Data quality needs attention (score: {:.0}). Review all hints before analysis.",
            score
        )
    }
}
