//! Local-disk object store.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use crate::error::StorageError;

use super::{validate_key, ObjectStore, StorageResult};

/// Object store rooted at a directory; keys map to relative paths.
#[derive(Debug, Clone)]
pub struct LocalDiskStore {
    root: PathBuf,
}

impl LocalDiskStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| io_error(&root.display().to_string(), e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, segment| path.join(segment)))
    }
}

/// Classify an IO failure: missing files, timeouts and interruptions are
/// distinguished from everything else.
fn io_error(key: &str, error: io::Error) -> StorageError {
    match error.kind() {
        ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
        ErrorKind::TimedOut | ErrorKind::Interrupted | ErrorKind::WouldBlock => {
            StorageError::Transient {
                key: key.to_string(),
                message: error.to_string(),
            }
        }
        _ => StorageError::Backend {
            key: key.to_string(),
            message: error.to_string(),
        },
    }
}

impl ObjectStore for LocalDiskStore {
    fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.path_for(key)?;
        fs::read(&path).map_err(|e| io_error(key, e))
    }

    fn put(&self, key: &str, bytes: &[u8]) -> StorageResult<String> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(key, e))?;
        }

        // Write beside the target and rename so readers never see a torn object
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let partial = path.with_file_name(format!(".{}.partial", file_name));
        fs::write(&partial, bytes).map_err(|e| io_error(key, e))?;
        fs::rename(&partial, &path).map_err(|e| io_error(key, e))?;

        Ok(key.to_string())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip_on_disk() {
        let dir = TempDir::new().unwrap();
        let store = LocalDiskStore::new(dir.path().join("objects")).unwrap();

        store.put("datasets/d/versions/v/rows.json", b"[]").unwrap();
        assert!(dir.path().join("objects/datasets/d/versions/v/rows.json").exists());
        assert_eq!(store.get("datasets/d/versions/v/rows.json").unwrap(), b"[]");

        store.put("datasets/d/versions/v/rows.json", b"[1]").unwrap();
        assert_eq!(store.get("datasets/d/versions/v/rows.json").unwrap(), b"[1]");
    }

    #[test]
    fn test_missing_object_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = LocalDiskStore::new(dir.path()).unwrap();

        assert!(matches!(store.get("nope"), Err(StorageError::NotFound(_))));
        store.delete("nope").unwrap();
    }

    #[test]
    fn test_rejects_escaping_keys() {
        let dir = TempDir::new().unwrap();
        let store = LocalDiskStore::new(dir.path()).unwrap();

        assert!(store.put("../outside", b"x").is_err());
    }
}
