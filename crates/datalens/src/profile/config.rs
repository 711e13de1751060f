//! Profiling configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Pairwise correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    /// Linear (product-moment) correlation.
    #[default]
    Pearson,
    /// Rank correlation, ties receive their average rank.
    Spearman,
}

impl CorrelationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationMethod::Pearson => "pearson",
            CorrelationMethod::Spearman => "spearman",
        }
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrelationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pearson" => Ok(CorrelationMethod::Pearson),
            "spearman" => Ok(CorrelationMethod::Spearman),
            other => Err(format!(
                "unknown correlation method '{}' (expected pearson or spearman)",
                other
            )),
        }
    }
}

/// Configuration for the profiling engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Number of equal-width histogram bins for numeric columns.
    pub histogram_bins: usize,
    /// Number of most frequent values kept per categorical column.
    pub top_n: usize,
    /// Correlation coefficient to compute.
    pub correlation_method: CorrelationMethod,
    /// Missing percentage at or above which a column gets a hint.
    pub missing_hint_threshold: f64,
    /// Unique percentage at or above which a column counts as ID-like.
    pub id_like_unique_threshold: f64,
    /// Outlier percentage at or above which a column gets a hint.
    pub outlier_hint_threshold: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            histogram_bins: 10,
            top_n: 10,
            correlation_method: CorrelationMethod::Pearson,
            missing_hint_threshold: 5.0,
            id_like_unique_threshold: 95.0,
            outlier_hint_threshold: 5.0,
        }
    }
}

impl ProfileConfig {
    /// Set the histogram bin count (at least one).
    pub fn with_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = bins.max(1);
        self
    }

    /// Set the frequency-table size.
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Set the correlation method.
    pub fn with_method(mut self, method: CorrelationMethod) -> Self {
        self.correlation_method = method;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProfileConfig::default();
        assert_eq!(config.histogram_bins, 10);
        assert_eq!(config.top_n, 10);
        assert_eq!(config.correlation_method, CorrelationMethod::Pearson);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ProfileConfig =
            serde_json::from_str(r#"{"histogram_bins": 4, "correlation_method": "spearman"}"#)
                .unwrap();

        assert_eq!(config.histogram_bins, 4);
        assert_eq!(config.correlation_method, CorrelationMethod::Spearman);
        assert_eq!(config.top_n, 10);
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("Spearman".parse::<CorrelationMethod>(), Ok(CorrelationMethod::Spearman));
        assert!("kendall".parse::<CorrelationMethod>().is_err());
    }
}
