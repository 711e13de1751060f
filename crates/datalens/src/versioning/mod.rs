//! Dataset versioning.
//!
//! A dataset starts empty. Every successful parse and inference pass becomes
//! a new immutable [`DatasetVersion`] whose rows and schema are written
//! through the [`ObjectStore`](crate::storage::ObjectStore) port and whose
//! record is written through the [`MetadataStore`] port. A dataset's active
//! version can point at any of its versions; moving it never deletes or
//! changes anything, so rolling back is just activating an older version.

mod manager;
mod metadata;
mod records;

pub use manager::VersionManager;
pub use metadata::{FileMetadataStore, InMemoryMetadataStore, MetadataStore};
pub use records::{
    artifact_key, schema_key, Dataset, DatasetState, DatasetVersion, RowArtifact, SourceRef,
    VersionProfile,
};
