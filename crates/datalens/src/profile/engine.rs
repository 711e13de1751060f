//! The profiling engine: runs every section with per-column isolation.

use std::convert::Infallible;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ProfileError, Result};
use crate::inference::{date_value, numeric_value};
use crate::input::{RawRow, RawValue};
use crate::jobs::CancelToken;
use crate::schema::{ColumnSchema, DatasetSchema, InferredType};

use super::config::ProfileConfig;
use super::correlation::{self, CorrelationMatrix};
use super::distribution::{self, Distribution};
use super::outliers::{self, ColumnOutliers};
use super::overview::{self, Overview};
use super::quality::{self, QualitySummary};

/// Version tag of the profiling algorithms. Stored with every persisted
/// profile; a profile is reproducible from the same rows, schema and tag.
pub const ALGORITHM_VERSION: &str = "datalens-profile/1";

/// The statistical profile of one dataset.
///
/// Serializes to exactly five keys: `overview`, `distributions`,
/// `correlations`, `outliers`, `qualitySummary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResult {
    pub overview: Overview,
    /// Keyed by column, in schema order. Failed columns are absent.
    pub distributions: IndexMap<String, Distribution>,
    pub correlations: CorrelationMatrix,
    /// Keyed by numeric column, in schema order. Failed columns are absent.
    pub outliers: IndexMap<String, ColumnOutliers>,
    pub quality_summary: QualitySummary,
}

/// Profile sections, for failure reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Overview,
    Distributions,
    Correlations,
    Outliers,
    QualitySummary,
}

/// One column (or column pair) whose section could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionFailure {
    pub section: Section,
    /// Column name, or `left/right` for a correlation pair.
    pub column: Option<String>,
    pub reason: String,
}

impl SectionFailure {
    fn new(section: Section, column: impl Into<String>, error: &ProfileError) -> Self {
        Self {
            section,
            column: Some(column.into()),
            reason: error.to_string(),
        }
    }
}

/// A profile plus whatever failed while computing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileReport {
    pub result: ProfileResult,
    pub failures: Vec<SectionFailure>,
}

impl ProfileReport {
    /// Whether every section succeeded for every column.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Computes profiles. Pure: no I/O, no shared state.
#[derive(Debug, Clone, Default)]
pub struct Profiler {
    config: ProfileConfig,
}

impl Profiler {
    /// Create a profiler with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a profiler with custom configuration.
    pub fn with_config(config: ProfileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    /// Profile a dataset. Never fails; per-column failures are reported
    /// in [`ProfileReport::failures`].
    pub fn profile(&self, rows: &[RawRow], schema: &DatasetSchema) -> ProfileReport {
        match self.run(rows, schema, || Ok::<(), Infallible>(())) {
            Ok(report) => report,
            Err(never) => match never {},
        }
    }

    /// Profile a dataset, checking `cancel` between columns and sections.
    pub fn profile_cancellable(
        &self,
        rows: &[RawRow],
        schema: &DatasetSchema,
        cancel: &CancelToken,
    ) -> Result<ProfileReport> {
        self.run(rows, schema, || cancel.check())
    }

    fn run<E>(
        &self,
        rows: &[RawRow],
        schema: &DatasetSchema,
        mut checkpoint: impl FnMut() -> std::result::Result<(), E>,
    ) -> std::result::Result<ProfileReport, E> {
        let mut failures = Vec::new();

        checkpoint()?;
        let overview = overview::compute(rows, schema);
        debug!(rows = overview.row_count, columns = overview.column_count, "profiled overview");

        let mut distributions = IndexMap::new();
        let mut numeric: Vec<(String, Vec<Option<f64>>)> = Vec::new();

        for column in &schema.columns {
            checkpoint()?;

            if !rows.is_empty() && !rows.iter().any(|row| row.contains_key(&column.name)) {
                let error = ProfileError::MissingColumn(column.name.clone());
                failures.push(SectionFailure::new(Section::Distributions, &column.name, &error));
                continue;
            }

            if column.inferred_type == InferredType::Number {
                numeric.push((
                    column.name.clone(),
                    column_cells(rows, &column.name).map(numeric_value).collect(),
                ));
            }

            match self.distribution(rows, column) {
                Ok(dist) => {
                    distributions.insert(column.name.clone(), dist);
                }
                Err(error) => {
                    failures.push(SectionFailure::new(Section::Distributions, &column.name, &error))
                }
            }
        }
        debug!(columns = distributions.len(), "profiled distributions");

        let mut outliers = IndexMap::new();
        for (name, values) in &numeric {
            checkpoint()?;

            let observations: Vec<(usize, f64)> = values
                .iter()
                .enumerate()
                .filter_map(|(row, value)| value.map(|v| (row, v)))
                .collect();
            match outliers::detect(&observations) {
                Ok(found) => {
                    outliers.insert(name.clone(), found);
                }
                Err(error) => failures.push(SectionFailure::new(Section::Outliers, name, &error)),
            }
        }
        debug!(columns = outliers.len(), "profiled outliers");

        checkpoint()?;
        let (correlations, pair_failures) =
            correlation::correlate(&numeric, self.config.correlation_method);
        failures.extend(pair_failures.into_iter().map(|failure| {
            SectionFailure::new(
                Section::Correlations,
                format!("{}/{}", failure.left, failure.right),
                &failure.error,
            )
        }));
        debug!(
            columns = correlations.columns.len(),
            method = %correlations.method,
            "profiled correlations"
        );

        checkpoint()?;
        let quality_summary = quality::compute(schema, &overview, &outliers, &self.config);

        for failure in &failures {
            warn!(
                section = ?failure.section,
                column = failure.column.as_deref().unwrap_or("-"),
                reason = %failure.reason,
                "profile section failed"
            );
        }

        Ok(ProfileReport {
            result: ProfileResult {
                overview,
                distributions,
                correlations,
                outliers,
                quality_summary,
            },
            failures,
        })
    }

    fn distribution(
        &self,
        rows: &[RawRow],
        column: &ColumnSchema,
    ) -> std::result::Result<Distribution, ProfileError> {
        let cells = column_cells(rows, &column.name);

        match column.inferred_type {
            InferredType::Number => {
                let values: Vec<f64> = cells.filter_map(numeric_value).collect();
                distribution::histogram(&values, self.config.histogram_bins)
                    .map(Distribution::Histogram)
            }
            InferredType::Date => {
                let dates: Vec<_> = cells.filter_map(date_value).collect();
                distribution::temporal(&dates).map(Distribution::Temporal)
            }
            InferredType::Boolean | InferredType::String => Ok(Distribution::Frequency(
                distribution::frequency(cells, self.config.top_n),
            )),
        }
    }
}

/// Every row's cell for `name`, with absent cells as null.
fn column_cells<'a>(rows: &'a [RawRow], name: &'a str) -> impl Iterator<Item = &'a RawValue> + 'a {
    rows.iter()
        .map(move |row| row.get(name).unwrap_or(&RawValue::NULL))
}
