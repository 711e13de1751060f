//! Background profiling jobs: single-flight, completion and cancellation.

use std::sync::{Arc, Condvar, Mutex};

use uuid::Uuid;

use datalens::storage::{MemoryObjectStore, StorageResult};
use datalens::versioning::InMemoryMetadataStore;
use datalens::{JobStatus, ObjectStore, Pipeline, PipelineConfig, ProfilingJobs, SourceRef};

/// Object store whose reads block until the test opens the gate, so a job
/// can be held in flight deterministically.
#[derive(Default)]
struct GatedStore {
    inner: MemoryObjectStore,
    open: Mutex<bool>,
    opened: Condvar,
}

impl GatedStore {
    fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.opened.notify_all();
    }
}

impl ObjectStore for GatedStore {
    fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.opened.wait(open).unwrap();
        }
        drop(open);
        self.inner.get(key)
    }

    fn put(&self, key: &str, bytes: &[u8]) -> StorageResult<String> {
        self.inner.put(key, bytes)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key)
    }
}

fn setup() -> (ProfilingJobs, Arc<Pipeline>, Arc<GatedStore>, Uuid) {
    let gate = Arc::new(GatedStore::default());
    let pipeline = Arc::new(Pipeline::new(
        PipelineConfig::default(),
        gate.clone(),
        Arc::new(InMemoryMetadataStore::new()),
    ));

    let dataset = pipeline.versions().create_dataset("jobs").unwrap();
    let version = pipeline
        .ingest(
            dataset.id,
            b"x,y,label\n1,2,a\n2,4,b\n3,6,a\n4,8,c\n",
            Some("jobs.csv"),
            SourceRef::upload("jobs.csv"),
        )
        .unwrap()
        .version;

    (ProfilingJobs::new(pipeline.clone()), pipeline, gate, version.id)
}

// =============================================================================
// Single flight
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_duplicate_submission_joins_running_job() {
    let (jobs, pipeline, gate, version_id) = setup();

    let first = jobs.submit(version_id);
    let second = jobs.submit(version_id);
    assert_eq!(first.job_id(), second.job_id());
    assert_eq!(jobs.in_flight(), 1);
    assert!(!first.status().is_terminal());

    gate.open();
    assert_eq!(first.wait().await, JobStatus::Completed { failures: 0 });
    assert_eq!(second.wait().await, JobStatus::Completed { failures: 0 });
    assert_eq!(jobs.in_flight(), 0);

    let profile = pipeline.versions().get_profile(version_id).unwrap();
    assert_eq!(profile.profile.overview.row_count, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_resubmission_after_completion_starts_new_job() {
    let (jobs, _pipeline, gate, version_id) = setup();
    gate.open();

    let first = jobs.submit(version_id);
    first.wait().await;
    let second = jobs.submit(version_id);

    assert_ne!(first.job_id(), second.job_id());
    assert_eq!(second.wait().await, JobStatus::Completed { failures: 0 });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_jobs_for_different_versions_run_independently() {
    let (jobs, pipeline, gate, first_version) = setup();
    let dataset_id = pipeline.versions().get_version(first_version).unwrap().dataset_id;
    let second_version = pipeline
        .ingest(dataset_id, b"n\n1\n2\n", None, SourceRef::upload("n.csv"))
        .unwrap()
        .version
        .id;

    let a = jobs.submit(first_version);
    let b = jobs.submit(second_version);
    assert_ne!(a.job_id(), b.job_id());
    assert_eq!(jobs.in_flight(), 2);

    gate.open();
    assert!(matches!(a.wait().await, JobStatus::Completed { .. }));
    assert!(matches!(b.wait().await, JobStatus::Completed { .. }));
    assert_eq!(jobs.in_flight(), 0);
}

// =============================================================================
// Failure and cancellation
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_job_attaches_nothing() {
    let (jobs, pipeline, gate, version_id) = setup();

    let handle = jobs.submit(version_id);
    handle.cancel();
    gate.open();

    assert_eq!(handle.wait().await, JobStatus::Cancelled);
    assert!(pipeline.versions().get_profile(version_id).is_err());
    assert_eq!(jobs.in_flight(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unknown_version_fails() {
    let (jobs, _pipeline, gate, _) = setup();
    gate.open();

    let handle = jobs.submit(Uuid::new_v4());
    match handle.wait().await {
        JobStatus::Failed { reason } => assert!(reason.contains("not found")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(jobs.in_flight(), 0);
}
