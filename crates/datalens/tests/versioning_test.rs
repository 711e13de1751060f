//! Dataset versioning over real stores: activation, rollback and
//! persistence across reopen.

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use datalens::storage::LocalDiskStore;
use datalens::versioning::FileMetadataStore;
use datalens::{
    CancelToken, DatasetState, LensError, ObjectStore, Pipeline, PipelineConfig, SourceRef,
};

fn disk_pipeline(root: &Path) -> Pipeline {
    let objects = LocalDiskStore::new(root.join("objects")).expect("object store");
    let metadata = FileMetadataStore::open(root.join("catalog.json")).expect("catalog");
    Pipeline::new(PipelineConfig::default(), Arc::new(objects), Arc::new(metadata))
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_rollback_keeps_newer_version_and_profile() {
    let pipeline = Pipeline::in_memory(PipelineConfig::default());
    let versions = pipeline.versions();
    let dataset = versions.create_dataset("orders").unwrap();
    assert_eq!(versions.state(dataset.id).unwrap(), DatasetState::Empty);

    let v1 = pipeline
        .ingest(dataset.id, b"id,total\n1,10\n2,20\n", Some("v1.csv"), SourceRef::upload("v1.csv"))
        .unwrap()
        .version;
    let v2 = pipeline
        .ingest(dataset.id, b"id,total\n1,10\n2,20\n3,35\n", Some("v2.csv"), SourceRef::upload("v2.csv"))
        .unwrap()
        .version;
    assert_eq!((v1.version_number, v2.version_number), (1, 2));
    assert_eq!(
        versions.state(dataset.id).unwrap(),
        DatasetState::HasVersions { latest: 2 }
    );

    let v2_profile = pipeline.profile_version(v2.id, &CancelToken::new()).unwrap();

    versions.activate_version(dataset.id, v2.id).unwrap();
    versions.activate_version(dataset.id, v1.id).unwrap();
    assert_eq!(
        versions.state(dataset.id).unwrap(),
        DatasetState::Active { version_number: 1, latest: 2 }
    );
    assert_eq!(versions.active_version(dataset.id).unwrap().unwrap().id, v1.id);

    // Rolling back deletes nothing
    assert_eq!(versions.get_version(v2.id).unwrap(), v2);
    assert_eq!(versions.get_profile(v2.id).unwrap(), v2_profile);
    assert_eq!(versions.load_rows(v2.id).unwrap().rows.len(), 3);
}

#[test]
fn test_versions_are_numbered_per_dataset() {
    let pipeline = Pipeline::in_memory(PipelineConfig::default());
    let a = pipeline.versions().create_dataset("a").unwrap();
    let b = pipeline.versions().create_dataset("b").unwrap();

    for _ in 0..3 {
        pipeline.ingest(a.id, b"x\n1\n", None, SourceRef::upload("a.csv")).unwrap();
    }
    let first_b = pipeline.ingest(b.id, b"x\n1\n", None, SourceRef::upload("b.csv")).unwrap();

    let numbers: Vec<u32> = pipeline
        .versions()
        .list_versions(a.id)
        .unwrap()
        .iter()
        .map(|v| v.version_number)
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(first_b.version.version_number, 1);
}

#[test]
fn test_cross_dataset_access_is_rejected() {
    let pipeline = Pipeline::in_memory(PipelineConfig::default());
    let a = pipeline.versions().create_dataset("a").unwrap();
    let b = pipeline.versions().create_dataset("b").unwrap();
    let version = pipeline
        .ingest(a.id, b"x\n1\n2\n", None, SourceRef::upload("a.csv"))
        .unwrap()
        .version;

    let err = pipeline.versions().activate_version(b.id, version.id).unwrap_err();
    assert!(matches!(err, LensError::NotFound { .. }));
    assert_eq!(pipeline.versions().get_dataset(b.id).unwrap().active_version_id, None);

    let err = pipeline.versions().load_rows_for(b.id, version.id).unwrap_err();
    assert!(matches!(err, LensError::DatasetMismatch { .. }));
}

#[test]
fn test_ingest_into_unknown_dataset() {
    let pipeline = Pipeline::in_memory(PipelineConfig::default());
    let err = pipeline
        .ingest(uuid::Uuid::new_v4(), b"x\n1\n", None, SourceRef::upload("x.csv"))
        .unwrap_err();

    assert!(matches!(err, LensError::NotFound { entity: "dataset", .. }));
}

#[test]
fn test_profile_targets_exact_version_rows() {
    let pipeline = Pipeline::in_memory(PipelineConfig::default());
    let dataset = pipeline.versions().create_dataset("d").unwrap();
    let v1 = pipeline
        .ingest(dataset.id, b"n\n1\n2\n", None, SourceRef::upload("1.csv"))
        .unwrap()
        .version;
    pipeline
        .ingest(dataset.id, b"n\n1\n2\n3\n4\n", None, SourceRef::upload("2.csv"))
        .unwrap();

    let profile = pipeline.profile_version(v1.id, &CancelToken::new()).unwrap();
    assert_eq!(profile.profile.overview.row_count, 2);
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_disk_stores_survive_reopen() {
    let dir = TempDir::new().unwrap();

    let (dataset_id, version_id, profile) = {
        let pipeline = disk_pipeline(dir.path());
        let dataset = pipeline.versions().create_dataset("persisted").unwrap();
        let version = pipeline
            .ingest(dataset.id, b"a,b\n1,x\n2,y\n,z\n", Some("p.csv"), SourceRef::upload("p.csv"))
            .unwrap()
            .version;
        pipeline.versions().activate_version(dataset.id, version.id).unwrap();
        let profile = pipeline.profile_version(version.id, &CancelToken::new()).unwrap();
        (dataset.id, version.id, profile)
    };

    let reopened = disk_pipeline(dir.path());
    let versions = reopened.versions();

    assert_eq!(versions.active_version(dataset_id).unwrap().unwrap().id, version_id);
    let stored = versions.get_profile(version_id).unwrap();
    assert_eq!(stored.computed_at, profile.computed_at);
    assert_eq!(stored.algorithm_version, profile.algorithm_version);
    assert_eq!(stored.profile.overview.row_count, 3);

    let artifact = versions.load_rows_for(dataset_id, version_id).unwrap();
    assert_eq!(artifact.columns, vec!["a", "b"]);
    assert_eq!(artifact.rows.len(), 3);
}

#[test]
fn test_failed_catalog_write_leaves_no_version() {
    let dir = TempDir::new().unwrap();
    let pipeline = disk_pipeline(dir.path());
    let dataset = pipeline.versions().create_dataset("blocked").unwrap();

    let blocker = dir.path().join("catalog.json.partial");
    std::fs::create_dir(&blocker).unwrap();
    let err = pipeline
        .ingest(dataset.id, b"x\n1\n", None, SourceRef::upload("x.csv"))
        .unwrap_err();
    assert!(matches!(err, LensError::Io { .. }));
    assert!(pipeline.versions().list_versions(dataset.id).unwrap().is_empty());
    assert_eq!(pipeline.versions().state(dataset.id).unwrap(), DatasetState::Empty);

    std::fs::remove_dir(&blocker).unwrap();
    let version = pipeline
        .ingest(dataset.id, b"x\n1\n", None, SourceRef::upload("x.csv"))
        .unwrap()
        .version;
    assert_eq!(version.version_number, 1);
    assert_eq!(pipeline.versions().load_rows(version.id).unwrap().rows.len(), 1);
}

#[test]
fn test_tampered_artifact_is_detected() {
    let dir = TempDir::new().unwrap();
    let pipeline = disk_pipeline(dir.path());
    let dataset = pipeline.versions().create_dataset("d").unwrap();
    let version = pipeline
        .ingest(dataset.id, b"x\n1\n2\n", None, SourceRef::upload("x.csv"))
        .unwrap()
        .version;

    pipeline
        .versions()
        .objects()
        .put(&version.artifact_ref, br#"{"columns":["x"],"rows":[]}"#)
        .unwrap();

    let err = pipeline.versions().load_rows(version.id).unwrap_err();
    assert!(matches!(err, LensError::ArtifactIntegrity { .. }));
}

#[test]
fn test_delete_dataset_removes_records() {
    let dir = TempDir::new().unwrap();
    let pipeline = disk_pipeline(dir.path());
    let dataset = pipeline.versions().create_dataset("gone").unwrap();
    let version = pipeline
        .ingest(dataset.id, b"x\n1\n", None, SourceRef::upload("x.csv"))
        .unwrap()
        .version;

    pipeline.versions().delete_dataset(dataset.id).unwrap();

    assert!(pipeline.versions().list_datasets().unwrap().is_empty());
    assert!(matches!(
        pipeline.versions().get_version(version.id).unwrap_err(),
        LensError::NotFound { .. }
    ));
    assert!(pipeline.versions().objects().get(&version.artifact_ref).is_err());
}
