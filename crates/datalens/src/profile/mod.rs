//! Statistical profiling: overview, distributions, correlations, outliers
//! and a composite quality score.
//!
//! [`Profiler::profile`] is a pure function of the rows, the inferred
//! schema and the [`ProfileConfig`]. A failure in one column or column pair
//! is recorded as a [`SectionFailure`] and the remaining columns and
//! sections are still computed.

mod config;
mod correlation;
mod distribution;
mod engine;
mod outliers;
mod overview;
mod quality;
mod stats;

pub use config::{CorrelationMethod, ProfileConfig};
pub use correlation::{CorrelationMatrix, CorrelationPair, Strength};
pub use distribution::{
    Distribution, FrequencyEntry, FrequencyTable, Histogram, HistogramBin, TemporalSummary,
};
pub use engine::{
    ProfileReport, ProfileResult, Profiler, Section, SectionFailure, ALGORITHM_VERSION,
};
pub use outliers::{ColumnOutliers, IqrBounds, IQR_MULTIPLIER};
pub use overview::Overview;
pub use quality::{HintKind, QualityHint, QualitySummary};
pub use stats::NumericSummary;
