//! In-process object store.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StorageError;

use super::{validate_key, ObjectStore, StorageResult};

/// Object store backed by a hash map. Used in tests and for one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted keys under a prefix.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .map(|objects| {
                objects
                    .keys()
                    .filter(|key| key.starts_with(prefix))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

fn poisoned(key: &str) -> StorageError {
    StorageError::Backend {
        key: key.to_string(),
        message: "store lock poisoned".to_string(),
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        let objects = self.objects.read().map_err(|_| poisoned(key))?;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn put(&self, key: &str, bytes: &[u8]) -> StorageResult<String> {
        validate_key(key)?;
        let mut objects = self.objects.write().map_err(|_| poisoned(key))?;
        objects.insert(key.to_string(), bytes.to_vec());
        Ok(key.to_string())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let mut objects = self.objects.write().map_err(|_| poisoned(key))?;
        objects.remove(key);
        Ok(())
    }
}
