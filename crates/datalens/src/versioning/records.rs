//! Persisted records: datasets, versions, profiles and row artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::input::RawRow;
use crate::profile::{ProfileResult, SectionFailure};
use crate::schema::DatasetSchema;

/// A named dataset. The only mutable record: its active-version pointer moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: Uuid,
    pub name: String,
    /// Always a version of this dataset, or unset.
    pub active_version_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Dataset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            active_version_id: None,
            created_at: Utc::now(),
        }
    }
}

/// Where a version's rows came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    /// e.g. `upload`.
    pub source_type: String,
    /// e.g. the uploaded file name.
    pub source_id: Option<String>,
}

impl SourceRef {
    pub fn new(source_type: impl Into<String>, source_id: Option<String>) -> Self {
        Self {
            source_type: source_type.into(),
            source_id,
        }
    }

    /// A file upload, identified by its file name.
    pub fn upload(file_name: impl Into<String>) -> Self {
        Self::new("upload", Some(file_name.into()))
    }
}

/// One immutable snapshot of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetVersion {
    pub id: Uuid,
    pub dataset_id: Uuid,
    /// 1-based, strictly increasing per dataset, never reused.
    pub version_number: u32,
    /// Object key of the serialized [`RowArtifact`].
    pub artifact_ref: String,
    /// `sha256:<hex>` of the artifact bytes.
    pub artifact_hash: String,
    /// Object key of the serialized schema.
    pub schema_ref: String,
    pub schema: DatasetSchema,
    pub source_type: String,
    pub source_id: Option<String>,
    pub row_count: usize,
    pub column_count: usize,
    pub created_at: DateTime<Utc>,
}

/// The profile attached to a version. At most one per version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionProfile {
    pub version_id: Uuid,
    pub profile: ProfileResult,
    pub failures: Vec<SectionFailure>,
    pub algorithm_version: String,
    pub computed_at: DateTime<Utc>,
}

/// Serialized snapshot of a version's parsed rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowArtifact {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Borrowed view used to write an artifact without cloning rows.
#[derive(Serialize)]
pub(crate) struct RowArtifactRef<'a> {
    pub columns: &'a [String],
    pub rows: &'a [RawRow],
}

/// Lifecycle state of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DatasetState {
    /// No versions yet.
    Empty,
    /// Versions exist but none is active.
    HasVersions { latest: u32 },
    /// A version is active.
    Active { version_number: u32, latest: u32 },
}

/// Object key of a version's row artifact.
pub fn artifact_key(dataset_id: Uuid, version_id: Uuid) -> String {
    format!("datasets/{}/versions/{}/rows.json", dataset_id, version_id)
}

/// Object key of a version's schema.
pub fn schema_key(dataset_id: Uuid, version_id: Uuid) -> String {
    format!("datasets/{}/versions/{}/schema.json", dataset_id, version_id)
}
