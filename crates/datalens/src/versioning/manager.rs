//! Immutable dataset versions, the active-version pointer and rollback.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{LensError, Result};
use crate::input::{content_hash, RawRow};
use crate::profile::{ProfileReport, ALGORITHM_VERSION};
use crate::schema::DatasetSchema;
use crate::storage::ObjectStore;

use super::metadata::MetadataStore;
use super::records::{
    artifact_key, schema_key, Dataset, DatasetState, DatasetVersion, RowArtifact, RowArtifactRef,
    SourceRef, VersionProfile,
};

/// Creates versions, attaches profiles and moves the active pointer.
///
/// Both collaborators are injected once and shared by reference; the
/// manager itself holds no dataset state.
pub struct VersionManager {
    objects: Arc<dyn ObjectStore>,
    metadata: Arc<dyn MetadataStore>,
    /// Serializes version-number assignment.
    numbering: Mutex<()>,
}

impl VersionManager {
    pub fn new(objects: Arc<dyn ObjectStore>, metadata: Arc<dyn MetadataStore>) -> Self {
        Self {
            objects,
            metadata,
            numbering: Mutex::new(()),
        }
    }

    pub fn objects(&self) -> &Arc<dyn ObjectStore> {
        &self.objects
    }

    pub fn metadata(&self) -> &Arc<dyn MetadataStore> {
        &self.metadata
    }

    // =========================================================================
    // Datasets
    // =========================================================================

    /// Create an empty dataset.
    pub fn create_dataset(&self, name: impl Into<String>) -> Result<Dataset> {
        let dataset = Dataset::new(name);
        self.metadata.insert_dataset(&dataset)?;
        info!(dataset = %dataset.id, name = %dataset.name, "created dataset");
        Ok(dataset)
    }

    pub fn get_dataset(&self, dataset_id: Uuid) -> Result<Dataset> {
        self.metadata
            .get_dataset(dataset_id)?
            .ok_or_else(|| LensError::not_found("dataset", dataset_id))
    }

    pub fn list_datasets(&self) -> Result<Vec<Dataset>> {
        self.metadata.list_datasets()
    }

    /// Delete a dataset with all its versions and profiles.
    ///
    /// Records are removed first; object cleanup is best-effort and only
    /// logged when it fails.
    pub fn delete_dataset(&self, dataset_id: Uuid) -> Result<()> {
        let removed = self.metadata.delete_dataset(dataset_id)?;

        for version in &removed {
            for key in [&version.artifact_ref, &version.schema_ref] {
                if let Err(error) = self.objects.delete(key) {
                    warn!(key = %key, error = %error, "failed to delete version object");
                }
            }
        }

        info!(dataset = %dataset_id, versions = removed.len(), "deleted dataset");
        Ok(())
    }

    /// Where a dataset is in its lifecycle.
    pub fn state(&self, dataset_id: Uuid) -> Result<DatasetState> {
        let dataset = self.get_dataset(dataset_id)?;
        let versions = self.metadata.list_versions(dataset_id)?;

        let Some(latest) = versions.iter().map(|v| v.version_number).max() else {
            return Ok(DatasetState::Empty);
        };

        let active = dataset
            .active_version_id
            .and_then(|id| versions.iter().find(|v| v.id == id));
        Ok(match active {
            Some(version) => DatasetState::Active {
                version_number: version.version_number,
                latest,
            },
            None => DatasetState::HasVersions { latest },
        })
    }

    // =========================================================================
    // Versions
    // =========================================================================

    /// Persist rows and schema as the next version of a dataset.
    ///
    /// The version number is one more than the highest existing number.
    /// The new version is not activated.
    pub fn create_version(
        &self,
        dataset_id: Uuid,
        columns: &[String],
        rows: &[RawRow],
        schema: &DatasetSchema,
        source: SourceRef,
    ) -> Result<DatasetVersion> {
        let _numbering = self.numbering.lock().unwrap_or_else(|e| e.into_inner());

        self.get_dataset(dataset_id)?;
        let version_number = self
            .metadata
            .list_versions(dataset_id)?
            .iter()
            .map(|v| v.version_number)
            .max()
            .unwrap_or(0)
            + 1;
        let version_id = Uuid::new_v4();

        let artifact = serde_json::to_vec(&RowArtifactRef { columns, rows })?;
        let artifact_hash = content_hash(&artifact);
        let artifact_ref = self
            .objects
            .put(&artifact_key(dataset_id, version_id), &artifact)?;
        let schema_ref = self.objects.put(
            &schema_key(dataset_id, version_id),
            &serde_json::to_vec(schema)?,
        )?;

        let version = DatasetVersion {
            id: version_id,
            dataset_id,
            version_number,
            artifact_ref,
            artifact_hash,
            schema_ref,
            schema: schema.clone(),
            source_type: source.source_type,
            source_id: source.source_id,
            row_count: schema.row_count,
            column_count: schema.column_count,
            created_at: Utc::now(),
        };

        if let Err(error) = self.metadata.insert_version(&version) {
            for key in [&version.artifact_ref, &version.schema_ref] {
                if let Err(cleanup) = self.objects.delete(key) {
                    warn!(key = %key, error = %cleanup, "failed to remove orphaned object");
                }
            }
            return Err(error);
        }

        info!(
            dataset = %dataset_id,
            version = %version_id,
            number = version_number,
            rows = version.row_count,
            "created version"
        );
        Ok(version)
    }

    pub fn get_version(&self, version_id: Uuid) -> Result<DatasetVersion> {
        self.metadata
            .get_version(version_id)?
            .ok_or_else(|| LensError::not_found("version", version_id))
    }

    /// Versions of a dataset, ascending by number.
    pub fn list_versions(&self, dataset_id: Uuid) -> Result<Vec<DatasetVersion>> {
        self.get_dataset(dataset_id)?;
        self.metadata.list_versions(dataset_id)
    }

    /// Read back the rows persisted for a version, verifying their hash.
    pub fn load_rows(&self, version_id: Uuid) -> Result<RowArtifact> {
        let version = self.get_version(version_id)?;
        self.read_artifact(&version)
    }

    /// Like [`load_rows`](Self::load_rows), but the version must belong to
    /// `dataset_id`.
    pub fn load_rows_for(&self, dataset_id: Uuid, version_id: Uuid) -> Result<RowArtifact> {
        let version = self.version_in(dataset_id, version_id)?;
        self.read_artifact(&version)
    }

    /// Fetch a version and check it belongs to `dataset_id`.
    pub fn version_in(&self, dataset_id: Uuid, version_id: Uuid) -> Result<DatasetVersion> {
        let version = self.get_version(version_id)?;
        if version.dataset_id != dataset_id {
            return Err(LensError::DatasetMismatch {
                dataset_id,
                version_id,
                owner_id: version.dataset_id,
            });
        }
        Ok(version)
    }

    fn read_artifact(&self, version: &DatasetVersion) -> Result<RowArtifact> {
        let bytes = self.objects.get(&version.artifact_ref)?;

        let actual = content_hash(&bytes);
        if actual != version.artifact_hash {
            return Err(LensError::ArtifactIntegrity {
                version_id: version.id,
                expected: version.artifact_hash.clone(),
                actual,
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// Attach a profile to a version, replacing any previous one.
    ///
    /// Re-attaching an identical profile keeps the stored record unchanged.
    pub fn attach_profile(&self, version_id: Uuid, report: &ProfileReport) -> Result<VersionProfile> {
        self.get_version(version_id)?;

        if let Some(existing) = self.metadata.get_profile(version_id)? {
            if existing.profile == report.result
                && existing.failures == report.failures
                && existing.algorithm_version == ALGORITHM_VERSION
            {
                return Ok(existing);
            }
        }

        let profile = VersionProfile {
            version_id,
            profile: report.result.clone(),
            failures: report.failures.clone(),
            algorithm_version: ALGORITHM_VERSION.to_string(),
            computed_at: Utc::now(),
        };
        self.metadata.upsert_profile(&profile)?;

        info!(
            version = %version_id,
            failures = profile.failures.len(),
            score = profile.profile.quality_summary.score,
            "attached profile"
        );
        Ok(profile)
    }

    pub fn get_profile(&self, version_id: Uuid) -> Result<VersionProfile> {
        self.metadata
            .get_profile(version_id)?
            .ok_or_else(|| LensError::not_found("profile", version_id))
    }

    // =========================================================================
    // Activation
    // =========================================================================

    /// Point a dataset at one of its versions.
    ///
    /// Any version may be activated, including older ones; no version or
    /// profile is touched. Fails with `NotFound` when the version does not
    /// belong to the dataset.
    pub fn activate_version(&self, dataset_id: Uuid, version_id: Uuid) -> Result<Dataset> {
        let mut dataset = self.get_dataset(dataset_id)?;

        let belongs = self
            .metadata
            .get_version(version_id)?
            .is_some_and(|v| v.dataset_id == dataset_id);
        if !belongs {
            return Err(LensError::NotFound {
                entity: "version",
                id: format!("{} in dataset {}", version_id, dataset_id),
            });
        }

        self.metadata.set_active_version(dataset_id, Some(version_id))?;
        dataset.active_version_id = Some(version_id);

        info!(dataset = %dataset_id, version = %version_id, "activated version");
        Ok(dataset)
    }

    /// The active version of a dataset, if any.
    pub fn active_version(&self, dataset_id: Uuid) -> Result<Option<DatasetVersion>> {
        let dataset = self.get_dataset(dataset_id)?;
        dataset
            .active_version_id
            .map(|id| self.get_version(id))
            .transpose()
    }
}
