//! Pairwise correlations between numeric columns.

use serde::{Deserialize, Serialize};

use crate::error::ProfileError;

use super::config::CorrelationMethod;
use super::stats;

/// Symmetric correlation matrix plus a ranked pair list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationMatrix {
    pub method: CorrelationMethod,
    /// Numeric columns, in schema order. Indexes both matrix axes.
    pub columns: Vec<String>,
    /// `null` where the coefficient is undefined; diagonal is 1.
    pub matrix: Vec<Vec<Option<f64>>>,
    /// Every unordered pair, strongest first.
    pub pairs: Vec<CorrelationPair>,
}

impl CorrelationMatrix {
    /// Coefficient between two columns by name.
    pub fn get(&self, left: &str, right: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == left)?;
        let j = self.columns.iter().position(|c| c == right)?;
        self.matrix[i][j]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationPair {
    pub left: String,
    pub right: String,
    pub coefficient: Option<f64>,
    /// Rows where both values are present.
    pub observations: usize,
    pub strength: Strength,
}

/// Strength label for an absolute coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    Strong,
    Moderate,
    Weak,
    VeryWeak,
    Undefined,
}

impl Strength {
    pub fn of(coefficient: Option<f64>) -> Strength {
        match coefficient.map(f64::abs) {
            None => Strength::Undefined,
            Some(r) if r >= 0.7 => Strength::Strong,
            Some(r) if r >= 0.4 => Strength::Moderate,
            Some(r) if r >= 0.2 => Strength::Weak,
            Some(_) => Strength::VeryWeak,
        }
    }
}

/// A pair whose coefficient could not be computed.
#[derive(Debug, Clone, PartialEq)]
pub struct PairFailure {
    pub left: String,
    pub right: String,
    pub error: ProfileError,
}

/// Correlate every pair of columns over pairwise-complete rows.
///
/// `columns` holds one entry per numeric column: its name and, per row,
/// the numeric value if present. A failing pair is reported and gets a
/// `null` coefficient; the rest of the matrix is unaffected.
pub fn correlate(
    columns: &[(String, Vec<Option<f64>>)],
    method: CorrelationMethod,
) -> (CorrelationMatrix, Vec<PairFailure>) {
    let n = columns.len();
    let mut matrix = vec![vec![None; n]; n];
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    let mut failures = Vec::new();

    for i in 0..n {
        matrix[i][i] = Some(1.0);

        for j in (i + 1)..n {
            let (left, xs) = &columns[i];
            let (right, ys) = &columns[j];
            let (xs, ys) = complete_pairs(xs, ys);

            let coefficient = match coefficient(&xs, &ys, method) {
                Ok(r) => r,
                Err(error) => {
                    failures.push(PairFailure {
                        left: left.clone(),
                        right: right.clone(),
                        error,
                    });
                    None
                }
            };

            matrix[i][j] = coefficient;
            matrix[j][i] = coefficient;
            pairs.push(CorrelationPair {
                left: left.clone(),
                right: right.clone(),
                coefficient,
                observations: xs.len(),
                strength: Strength::of(coefficient),
            });
        }
    }

    // Strongest first; undefined pairs last, ties broken by names
    pairs.sort_by(|a, b| {
        let a_abs = a.coefficient.map(f64::abs).unwrap_or(-1.0);
        let b_abs = b.coefficient.map(f64::abs).unwrap_or(-1.0);
        b_abs
            .total_cmp(&a_abs)
            .then_with(|| a.left.cmp(&b.left))
            .then_with(|| a.right.cmp(&b.right))
    });

    let matrix = CorrelationMatrix {
        method,
        columns: columns.iter().map(|(name, _)| name.clone()).collect(),
        matrix,
        pairs,
    };
    (matrix, failures)
}

fn complete_pairs(xs: &[Option<f64>], ys: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    xs.iter()
        .zip(ys.iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip()
}

fn coefficient(
    xs: &[f64],
    ys: &[f64],
    method: CorrelationMethod,
) -> Result<Option<f64>, ProfileError> {
    match method {
        CorrelationMethod::Pearson => stats::pearson(xs, ys),
        CorrelationMethod::Spearman => {
            if stats::is_constant(xs) || stats::is_constant(ys) {
                return Ok(None);
            }
            stats::pearson(&stats::average_ranks(xs), &stats::average_ranks(ys))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, values: &[Option<f64>]) -> (String, Vec<Option<f64>>) {
        (name.to_string(), values.to_vec())
    }

    #[test]
    fn test_matrix_symmetric_with_unit_diagonal() {
        let columns = vec![
            column("a", &[Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
            column("b", &[Some(2.0), Some(4.1), Some(5.9), Some(8.0)]),
            column("c", &[Some(4.0), Some(1.0), Some(3.0), Some(2.0)]),
        ];
        let (corr, failures) = correlate(&columns, CorrelationMethod::Pearson);

        assert!(failures.is_empty());
        for i in 0..3 {
            assert_eq!(corr.matrix[i][i], Some(1.0));
            for j in 0..3 {
                assert_eq!(corr.matrix[i][j], corr.matrix[j][i]);
            }
        }
        assert_eq!(corr.pairs.len(), 3);
        assert_eq!(corr.pairs[0].strength, Strength::Strong);
        assert_eq!(corr.pairs[0].left, "a");
        assert_eq!(corr.pairs[0].right, "b");
    }

    #[test]
    fn test_zero_variance_is_null() {
        let columns = vec![
            column("a", &[Some(1.0), Some(2.0), Some(3.0)]),
            column("k", &[Some(5.0), Some(5.0), Some(5.0)]),
        ];
        let (corr, _) = correlate(&columns, CorrelationMethod::Pearson);

        assert_eq!(corr.get("a", "k"), None);
        assert_eq!(corr.get("k", "k"), Some(1.0));
        assert_eq!(corr.pairs[0].strength, Strength::Undefined);
    }

    #[test]
    fn test_pairwise_complete_observations() {
        let columns = vec![
            column("a", &[Some(1.0), None, Some(3.0), Some(4.0)]),
            column("b", &[Some(1.0), Some(9.0), None, Some(4.0)]),
        ];
        let (corr, _) = correlate(&columns, CorrelationMethod::Pearson);

        assert_eq!(corr.pairs[0].observations, 2);
        assert_eq!(corr.get("a", "b"), Some(1.0));
    }

    #[test]
    fn test_too_few_observations_is_null() {
        let columns = vec![
            column("a", &[Some(1.0), None]),
            column("b", &[Some(2.0), Some(3.0)]),
        ];
        let (corr, _) = correlate(&columns, CorrelationMethod::Pearson);

        assert_eq!(corr.get("a", "b"), None);
    }

    #[test]
    fn test_spearman_is_rank_based() {
        let columns = vec![
            column("a", &[Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
            column("b", &[Some(1.0), Some(10.0), Some(100.0), Some(1000.0)]),
        ];
        let (corr, _) = correlate(&columns, CorrelationMethod::Spearman);
        let r = corr.get("a", "b").unwrap();

        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_overflow_reported_as_failure() {
        let columns = vec![
            column("a", &[Some(f64::MAX), Some(f64::MAX), Some(-f64::MAX)]),
            column("b", &[Some(1.0), Some(2.0), Some(3.0)]),
        ];
        let (corr, failures) = correlate(&columns, CorrelationMethod::Pearson);

        assert_eq!(failures.len(), 1);
        assert_eq!(corr.get("a", "b"), None);
    }

    #[test]
    fn test_strength_labels() {
        assert_eq!(Strength::of(Some(-0.75)), Strength::Strong);
        assert_eq!(Strength::of(Some(0.4)), Strength::Moderate);
        assert_eq!(Strength::of(Some(0.2)), Strength::Weak);
        assert_eq!(Strength::of(Some(0.1)), Strength::VeryWeak);
        assert_eq!(Strength::of(None), Strength::Undefined);
    }
}
