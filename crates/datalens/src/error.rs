//! Error types for the datalens library.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

use crate::input::DataFormat;

/// Main error type for datalens operations.
#[derive(Debug, Error)]
pub enum LensError {
    /// Malformed CSV/XLSX/JSON input. No dataset is produced.
    #[error("Parse error ({format}): {message}")]
    Parse { format: DataFormat, message: String },

    /// Unknown dataset, version or profile.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// A version was addressed through a dataset it does not belong to.
    #[error("Version '{version_id}' belongs to dataset '{owner_id}', not '{dataset_id}'")]
    DatasetMismatch {
        dataset_id: Uuid,
        version_id: Uuid,
        owner_id: Uuid,
    },

    /// The metadata store refused a write that would break an invariant.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored artifact no longer matches the hash recorded at creation.
    #[error("Artifact for version '{version_id}' is corrupted (expected {expected}, got {actual})")]
    ArtifactIntegrity {
        version_id: Uuid,
        expected: String,
        actual: String,
    },

    /// Error from the object-store collaborator.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A profiling job observed its cancellation flag.
    #[error("Operation cancelled")]
    Cancelled,

    /// A background job could not be run to completion.
    #[error("Job error: {0}")]
    Job(String),
}

impl LensError {
    pub(crate) fn parse(format: DataFormat, message: impl Into<String>) -> Self {
        LensError::Parse {
            format,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        LensError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Errors raised at the object-store boundary.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// No object exists under the key.
    #[error("object '{0}' not found")]
    NotFound(String),

    /// Timeout or temporary unavailability; safe to retry.
    #[error("transient failure for '{key}': {message}")]
    Transient { key: String, message: String },

    /// Any other backend failure.
    #[error("backend failure for '{key}': {message}")]
    Backend { key: String, message: String },
}

impl StorageError {
    /// Whether the operation may succeed if attempted again.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Transient { .. })
    }
}

/// Failure of one profiling section for one column or column pair.
///
/// These are collected into the profile report and never propagated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    /// A statistic overflowed or was otherwise not a finite number.
    #[error("{statistic} is not finite")]
    NonFinite { statistic: &'static str },

    /// A section that needs values was handed none.
    #[error("no values to compute {0}")]
    Empty(&'static str),

    /// The column named in the schema is absent from every row.
    #[error("column '{0}' is missing from the rows")]
    MissingColumn(String),
}

/// Result type alias for datalens operations.
pub type Result<T> = std::result::Result<T, LensError>;
