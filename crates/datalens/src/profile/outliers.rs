//! IQR outlier detection for numeric columns.

use serde::{Deserialize, Serialize};

use crate::error::ProfileError;
use crate::inference::round2;

use super::stats;

/// Fence multiplier: values outside `[Q1 - k·IQR, Q3 + k·IQR]` are outliers.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// Quartiles and fences of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Outliers flagged in one column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnOutliers {
    /// `None` when the column has no numeric values.
    pub bounds: Option<IqrBounds>,
    pub count: usize,
    /// Share of the column's numeric values, 2 dp.
    pub percentage: f64,
    /// Zero-based row indices, ascending.
    pub row_indices: Vec<usize>,
    /// Flagged values, aligned with `row_indices`.
    pub values: Vec<f64>,
}

impl ColumnOutliers {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Flag IQR outliers among `(row index, value)` observations.
pub fn detect(observations: &[(usize, f64)]) -> Result<ColumnOutliers, ProfileError> {
    if observations.is_empty() {
        return Ok(ColumnOutliers::default());
    }

    let values: Vec<f64> = observations.iter().map(|&(_, v)| v).collect();
    let sorted = stats::sorted(&values);
    let q1 = stats::quantile(&sorted, 0.25)?;
    let q3 = stats::quantile(&sorted, 0.75)?;
    let iqr = q3 - q1;
    let lower_bound = q1 - IQR_MULTIPLIER * iqr;
    let upper_bound = q3 + IQR_MULTIPLIER * iqr;
    if !(iqr.is_finite() && lower_bound.is_finite() && upper_bound.is_finite()) {
        return Err(ProfileError::NonFinite { statistic: "iqr" });
    }

    let (row_indices, flagged): (Vec<usize>, Vec<f64>) = observations
        .iter()
        .filter(|&&(_, v)| v < lower_bound || v > upper_bound)
        .copied()
        .unzip();

    let count = row_indices.len();
    Ok(ColumnOutliers {
        bounds: Some(IqrBounds {
            q1,
            q3,
            iqr,
            lower_bound,
            upper_bound,
        }),
        count,
        percentage: round2(count as f64 / values.len() as f64 * 100.0),
        row_indices,
        values: flagged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexed(values: &[f64]) -> Vec<(usize, f64)> {
        values.iter().copied().enumerate().collect()
    }

    #[test]
    fn test_flags_extremes() {
        let outliers = detect(&indexed(&[10.0, 12.0, 11.0, 13.0, 12.0, 100.0, -50.0])).unwrap();

        assert_eq!(outliers.row_indices, vec![5, 6]);
        assert_eq!(outliers.values, vec![100.0, -50.0]);
        assert_eq!(outliers.count, 2);
        assert_eq!(outliers.percentage, 28.57);
    }

    #[test]
    fn test_constant_column_has_no_outliers() {
        let outliers = detect(&indexed(&[3.0; 8])).unwrap();

        assert!(outliers.is_empty());
        assert_eq!(outliers.bounds.unwrap().iqr, 0.0);
    }

    #[test]
    fn test_empty_column() {
        let outliers = detect(&[]).unwrap();

        assert!(outliers.is_empty());
        assert!(outliers.bounds.is_none());
        assert_eq!(outliers.percentage, 0.0);
    }

    #[test]
    fn test_row_indices_are_preserved() {
        let outliers = detect(&[(2, 1.0), (5, 1.0), (9, 1.0), (14, 1.0), (20, 50.0)]).unwrap();
        assert_eq!(outliers.row_indices, vec![20]);
    }
}
