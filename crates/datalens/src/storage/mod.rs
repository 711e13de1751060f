//! The object-storage port and its adapters.
//!
//! The core only ever sees [`ObjectStore`]: opaque bytes under string keys.
//! Whether those bytes live in memory, on local disk or in a remote bucket
//! is decided once at process start by whoever builds the store.

mod disk;
mod memory;
mod retry;

pub use disk::LocalDiskStore;
pub use memory::MemoryObjectStore;
pub use retry::{RetryPolicy, RetryingStore};

use crate::error::StorageError;

/// Result type for object-store operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Narrow storage port: opaque bytes under string keys.
pub trait ObjectStore: Send + Sync {
    /// Read the object stored under `key`.
    fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Store `bytes` under `key`, replacing any previous object.
    /// Returns the key the object can be read back with.
    fn put(&self, key: &str, bytes: &[u8]) -> StorageResult<String>;

    /// Remove the object under `key`. Removing a missing object is not an error.
    fn delete(&self, key: &str) -> StorageResult<()>;
}

impl<S: ObjectStore + ?Sized> ObjectStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, bytes: &[u8]) -> StorageResult<String> {
        (**self).put(key, bytes)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        (**self).delete(key)
    }
}

/// Reject keys that are empty, absolute or escape the store root.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('/')
        && !key.contains('\\')
        && key
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");

    if valid {
        Ok(())
    } else {
        Err(StorageError::Backend {
            key: key.to_string(),
            message: "invalid object key".to_string(),
        })
    }
}
