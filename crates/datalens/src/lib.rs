//! Datalens: typed, versioned datasets and statistical profiles from
//! uploaded tabular files.
//!
//! An uploaded CSV, XLSX or JSON buffer goes through four stages:
//!
//! - **Parsing** turns bytes into an ordered column list and untyped records
//! - **Schema inference** classifies every column (type, nullability, cardinality)
//! - **Profiling** computes an overview, distributions, correlations, outliers
//!   and a quality score
//! - **Versioning** stores rows and schema as an immutable dataset version and
//!   tracks which version is active
//!
//! Parsing, inference and profiling are pure and deterministic. Storage goes
//! through two injected ports, [`ObjectStore`] and [`MetadataStore`].
//!
//! # Example
//!
//! ```no_run
//! use datalens::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::in_memory(PipelineConfig::default());
//! let analysis = pipeline.analyze_file("sales.csv").unwrap();
//!
//! println!("Columns: {}", analysis.schema.column_count);
//! println!("Quality: {}", analysis.report.result.quality_summary.score);
//! ```

pub mod error;
pub mod inference;
pub mod input;
pub mod jobs;
pub mod profile;
pub mod schema;
pub mod storage;
pub mod versioning;

mod pipeline;

pub use error::{LensError, ProfileError, Result, StorageError};
pub use inference::SchemaInferrer;
pub use input::{DataFormat, ParsedDataset, Parser, ParserConfig, RawRow, RawValue, SourceMetadata};
pub use jobs::{CancelToken, JobHandle, JobStatus, ProfilingJobs};
pub use pipeline::{Analysis, Ingestion, Pipeline, PipelineConfig};
pub use profile::{ProfileConfig, ProfileReport, ProfileResult, Profiler};
pub use schema::{ColumnSchema, DatasetSchema, InferredType};
pub use storage::{ObjectStore, RetryPolicy};
pub use versioning::{
    Dataset, DatasetState, DatasetVersion, MetadataStore, SourceRef, VersionManager,
    VersionProfile,
};
