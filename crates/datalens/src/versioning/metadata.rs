//! The persistence port for dataset, version and profile records.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LensError, Result};

use super::records::{Dataset, DatasetVersion, VersionProfile};

/// Create/read/update-pointer access to persisted records.
pub trait MetadataStore: Send + Sync {
    fn insert_dataset(&self, dataset: &Dataset) -> Result<()>;

    fn get_dataset(&self, id: Uuid) -> Result<Option<Dataset>>;

    fn list_datasets(&self) -> Result<Vec<Dataset>>;

    /// Remove a dataset with its versions and profiles. Returns the removed
    /// versions so their objects can be cleaned up.
    fn delete_dataset(&self, id: Uuid) -> Result<Vec<DatasetVersion>>;

    fn set_active_version(&self, dataset_id: Uuid, version_id: Option<Uuid>) -> Result<()>;

    /// Insert a version. Fails with `Conflict` if the dataset already has
    /// a version with the same number.
    fn insert_version(&self, version: &DatasetVersion) -> Result<()>;

    fn get_version(&self, id: Uuid) -> Result<Option<DatasetVersion>>;

    /// Versions of a dataset, ascending by number.
    fn list_versions(&self, dataset_id: Uuid) -> Result<Vec<DatasetVersion>>;

    /// Insert or replace the profile of a version.
    fn upsert_profile(&self, profile: &VersionProfile) -> Result<()>;

    fn get_profile(&self, version_id: Uuid) -> Result<Option<VersionProfile>>;
}

// =============================================================================
// CATALOG
// =============================================================================
// All records in one serializable value, shared by both stores.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Catalog {
    datasets: IndexMap<Uuid, Dataset>,
    versions: IndexMap<Uuid, DatasetVersion>,
    profiles: IndexMap<Uuid, VersionProfile>,
}

impl Catalog {
    fn insert_dataset(&mut self, dataset: &Dataset) -> Result<()> {
        if self.datasets.contains_key(&dataset.id) {
            return Err(LensError::Conflict(format!("dataset '{}' already exists", dataset.id)));
        }
        self.datasets.insert(dataset.id, dataset.clone());
        Ok(())
    }

    fn delete_dataset(&mut self, id: Uuid) -> Result<Vec<DatasetVersion>> {
        if self.datasets.shift_remove(&id).is_none() {
            return Err(LensError::not_found("dataset", id));
        }

        let removed: Vec<DatasetVersion> = self
            .versions
            .values()
            .filter(|v| v.dataset_id == id)
            .cloned()
            .collect();
        for version in &removed {
            self.versions.shift_remove(&version.id);
            self.profiles.shift_remove(&version.id);
        }
        Ok(removed)
    }

    fn set_active_version(&mut self, dataset_id: Uuid, version_id: Option<Uuid>) -> Result<()> {
        let dataset = self
            .datasets
            .get_mut(&dataset_id)
            .ok_or_else(|| LensError::not_found("dataset", dataset_id))?;
        dataset.active_version_id = version_id;
        Ok(())
    }

    fn insert_version(&mut self, version: &DatasetVersion) -> Result<()> {
        if !self.datasets.contains_key(&version.dataset_id) {
            return Err(LensError::not_found("dataset", version.dataset_id));
        }
        if self.versions.contains_key(&version.id) {
            return Err(LensError::Conflict(format!("version '{}' already exists", version.id)));
        }
        let taken = self.versions.values().any(|v| {
            v.dataset_id == version.dataset_id && v.version_number == version.version_number
        });
        if taken {
            return Err(LensError::Conflict(format!(
                "dataset '{}' already has version {}",
                version.dataset_id, version.version_number
            )));
        }

        self.versions.insert(version.id, version.clone());
        Ok(())
    }

    fn list_versions(&self, dataset_id: Uuid) -> Vec<DatasetVersion> {
        let mut versions: Vec<DatasetVersion> = self
            .versions
            .values()
            .filter(|v| v.dataset_id == dataset_id)
            .cloned()
            .collect();
        versions.sort_by_key(|v| v.version_number);
        versions
    }

    fn upsert_profile(&mut self, profile: &VersionProfile) -> Result<()> {
        if !self.versions.contains_key(&profile.version_id) {
            return Err(LensError::not_found("version", profile.version_id));
        }
        self.profiles.insert(profile.version_id, profile.clone());
        Ok(())
    }
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// Metadata store held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    catalog: RwLock<Catalog>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Catalog mutations are single assignments, so a poisoned lock still
    // guards a consistent value.
    fn read(&self) -> RwLockReadGuard<'_, Catalog> {
        self.catalog.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Catalog> {
        self.catalog.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn insert_dataset(&self, dataset: &Dataset) -> Result<()> {
        self.write().insert_dataset(dataset)
    }

    fn get_dataset(&self, id: Uuid) -> Result<Option<Dataset>> {
        Ok(self.read().datasets.get(&id).cloned())
    }

    fn list_datasets(&self) -> Result<Vec<Dataset>> {
        Ok(self.read().datasets.values().cloned().collect())
    }

    fn delete_dataset(&self, id: Uuid) -> Result<Vec<DatasetVersion>> {
        self.write().delete_dataset(id)
    }

    fn set_active_version(&self, dataset_id: Uuid, version_id: Option<Uuid>) -> Result<()> {
        self.write().set_active_version(dataset_id, version_id)
    }

    fn insert_version(&self, version: &DatasetVersion) -> Result<()> {
        self.write().insert_version(version)
    }

    fn get_version(&self, id: Uuid) -> Result<Option<DatasetVersion>> {
        Ok(self.read().versions.get(&id).cloned())
    }

    fn list_versions(&self, dataset_id: Uuid) -> Result<Vec<DatasetVersion>> {
        Ok(self.read().list_versions(dataset_id))
    }

    fn upsert_profile(&self, profile: &VersionProfile) -> Result<()> {
        self.write().upsert_profile(profile)
    }

    fn get_profile(&self, version_id: Uuid) -> Result<Option<VersionProfile>> {
        Ok(self.read().profiles.get(&version_id).cloned())
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// Metadata store persisted to a single JSON catalog file.
///
/// Every mutation rewrites the file; reads are served from memory.
#[derive(Debug)]
pub struct FileMetadataStore {
    path: PathBuf,
    memory: InMemoryMetadataStore,
    save_lock: Mutex<()>,
}

impl FileMetadataStore {
    /// Open a catalog file, starting empty if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let catalog = if path.exists() {
            let file = File::open(&path).map_err(|source| LensError::Io {
                path: path.clone(),
                source,
            })?;
            serde_json::from_reader(BufReader::new(file))?
        } else {
            Catalog::default()
        };

        Ok(Self {
            path,
            memory: InMemoryMetadataStore {
                catalog: RwLock::new(catalog),
            },
            save_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply a mutation to a copy of the catalog and persist it. The copy
    /// replaces the in-memory catalog only once the file is written.
    fn mutate<T>(&self, apply: impl FnOnce(&mut Catalog) -> Result<T>) -> Result<T> {
        let _guard = self.save_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = self.memory.read().clone();
        let value = apply(&mut next)?;
        self.save(&next)?;
        *self.memory.write() = next;
        Ok(value)
    }

    fn save(&self, catalog: &Catalog) -> Result<()> {
        let io = |source: std::io::Error| LensError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(io)?;
            }
        }

        let partial = self.path.with_extension("json.partial");
        {
            let file = File::create(&partial).map_err(io)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, catalog)?;
            writer.flush().map_err(io)?;
        }
        fs::rename(&partial, &self.path).map_err(io)?;
        Ok(())
    }
}

impl MetadataStore for FileMetadataStore {
    fn insert_dataset(&self, dataset: &Dataset) -> Result<()> {
        self.mutate(|c| c.insert_dataset(dataset))
    }

    fn get_dataset(&self, id: Uuid) -> Result<Option<Dataset>> {
        self.memory.get_dataset(id)
    }

    fn list_datasets(&self) -> Result<Vec<Dataset>> {
        self.memory.list_datasets()
    }

    fn delete_dataset(&self, id: Uuid) -> Result<Vec<DatasetVersion>> {
        self.mutate(|c| c.delete_dataset(id))
    }

    fn set_active_version(&self, dataset_id: Uuid, version_id: Option<Uuid>) -> Result<()> {
        self.mutate(|c| c.set_active_version(dataset_id, version_id))
    }

    fn insert_version(&self, version: &DatasetVersion) -> Result<()> {
        self.mutate(|c| c.insert_version(version))
    }

    fn get_version(&self, id: Uuid) -> Result<Option<DatasetVersion>> {
        self.memory.get_version(id)
    }

    fn list_versions(&self, dataset_id: Uuid) -> Result<Vec<DatasetVersion>> {
        self.memory.list_versions(dataset_id)
    }

    fn upsert_profile(&self, profile: &VersionProfile) -> Result<()> {
        self.mutate(|c| c.upsert_profile(profile))
    }

    fn get_profile(&self, version_id: Uuid) -> Result<Option<VersionProfile>> {
        self.memory.get_profile(version_id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::TempDir;

    use super::*;
    use crate::schema::DatasetSchema;

    fn version(dataset_id: Uuid, number: u32) -> DatasetVersion {
        DatasetVersion {
            id: Uuid::new_v4(),
            dataset_id,
            version_number: number,
            artifact_ref: "rows".to_string(),
            artifact_hash: "sha256:00".to_string(),
            schema_ref: "schema".to_string(),
            schema: DatasetSchema::default(),
            source_type: "test".to_string(),
            source_id: None,
            row_count: 0,
            column_count: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_duplicate_version_number_conflicts() {
        let store = InMemoryMetadataStore::new();
        let dataset = Dataset::new("d");
        store.insert_dataset(&dataset).unwrap();

        store.insert_version(&version(dataset.id, 1)).unwrap();
        let err = store.insert_version(&version(dataset.id, 1)).unwrap_err();
        assert!(matches!(err, LensError::Conflict(_)));
    }

    #[test]
    fn test_version_needs_dataset() {
        let store = InMemoryMetadataStore::new();
        let err = store.insert_version(&version(Uuid::new_v4(), 1)).unwrap_err();
        assert!(matches!(err, LensError::NotFound { .. }));
    }

    #[test]
    fn test_list_versions_sorted() {
        let store = InMemoryMetadataStore::new();
        let dataset = Dataset::new("d");
        store.insert_dataset(&dataset).unwrap();
        store.insert_version(&version(dataset.id, 2)).unwrap();
        store.insert_version(&version(dataset.id, 1)).unwrap();

        let numbers: Vec<u32> = store
            .list_versions(dataset.id)
            .unwrap()
            .iter()
            .map(|v| v.version_number)
            .collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_delete_cascades() {
        let store = InMemoryMetadataStore::new();
        let dataset = Dataset::new("d");
        store.insert_dataset(&dataset).unwrap();
        let v1 = version(dataset.id, 1);
        store.insert_version(&v1).unwrap();

        let removed = store.delete_dataset(dataset.id).unwrap();
        assert_eq!(removed.len(), 1);
        assert!(store.get_version(v1.id).unwrap().is_none());
        assert!(store.get_dataset(dataset.id).unwrap().is_none());
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        let dataset = Dataset::new("sales");
        let v1 = version(dataset.id, 1);

        {
            let store = FileMetadataStore::open(&path).unwrap();
            store.insert_dataset(&dataset).unwrap();
            store.insert_version(&v1).unwrap();
            store.set_active_version(dataset.id, Some(v1.id)).unwrap();
        }

        let reopened = FileMetadataStore::open(&path).unwrap();
        let loaded = reopened.get_dataset(dataset.id).unwrap().unwrap();
        assert_eq!(loaded.name, "sales");
        assert_eq!(loaded.active_version_id, Some(v1.id));
        assert_eq!(reopened.list_versions(dataset.id).unwrap(), vec![v1]);
    }

    #[test]
    fn test_failed_save_leaves_catalog_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        let store = FileMetadataStore::open(&path).unwrap();
        let kept = Dataset::new("kept");
        store.insert_dataset(&kept).unwrap();

        // A directory in the way of the partial file makes every save fail
        fs::create_dir(path.with_extension("json.partial")).unwrap();

        let lost = Dataset::new("lost");
        let err = store.insert_dataset(&lost).unwrap_err();
        assert!(matches!(err, LensError::Io { .. }));
        assert!(store.get_dataset(lost.id).unwrap().is_none());

        assert!(store.insert_version(&version(kept.id, 1)).is_err());
        assert!(store.list_versions(kept.id).unwrap().is_empty());

        let reopened = FileMetadataStore::open(&path).unwrap();
        assert_eq!(reopened.list_datasets().unwrap().len(), 1);
    }
}
