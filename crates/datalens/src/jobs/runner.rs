//! Single-flight job registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::LensError;
use crate::pipeline::Pipeline;

use super::cancel::CancelToken;

/// Lifecycle of a profiling job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    /// Every section was attempted and the profile is attached.
    /// `failures` counts the columns or pairs that could not be computed.
    Completed { failures: usize },
    Failed { reason: String },
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed { .. } | JobStatus::Failed { .. } | JobStatus::Cancelled
        )
    }
}

/// Handle to a submitted job. Clones observe the same job.
#[derive(Debug, Clone)]
pub struct JobHandle {
    job_id: Uuid,
    version_id: Uuid,
    status: watch::Receiver<JobStatus>,
    cancel: CancelToken,
}

impl JobHandle {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn version_id(&self) -> Uuid {
        self.version_id
    }

    /// Current status, without waiting.
    pub fn status(&self) -> JobStatus {
        self.status.borrow().clone()
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the job to reach a terminal status.
    pub async fn wait(&self) -> JobStatus {
        let mut status = self.status.clone();
        if let Ok(terminal) = status.wait_for(JobStatus::is_terminal).await {
            return terminal.clone();
        }

        // The worker went away without reporting (it panicked)
        let last = status.borrow().clone();
        if last.is_terminal() {
            last
        } else {
            JobStatus::Failed {
                reason: "job aborted before reporting a result".to_string(),
            }
        }
    }
}

type InFlight = Arc<Mutex<HashMap<Uuid, JobHandle>>>;

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashMap<Uuid, JobHandle>> {
    in_flight.lock().unwrap_or_else(|e| e.into_inner())
}

/// Removes a job from the in-flight table when the worker finishes,
/// including by panic.
struct InFlightGuard {
    in_flight: InFlight,
    version_id: Uuid,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.in_flight).remove(&self.version_id);
    }
}

/// Runs profiling jobs against a shared pipeline.
#[derive(Clone)]
pub struct ProfilingJobs {
    pipeline: Arc<Pipeline>,
    in_flight: InFlight,
}

impl ProfilingJobs {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of jobs currently in flight.
    pub fn in_flight(&self) -> usize {
        lock(&self.in_flight).len()
    }

    /// Profile a version in the background and attach the result.
    ///
    /// Must be called from within a tokio runtime. If the version is already
    /// being profiled, the existing job's handle is returned.
    pub fn submit(&self, version_id: Uuid) -> JobHandle {
        let mut in_flight = lock(&self.in_flight);
        if let Some(existing) = in_flight.get(&version_id) {
            info!(version = %version_id, job = %existing.job_id, "joined in-flight profiling job");
            return existing.clone();
        }

        let (sender, receiver) = watch::channel(JobStatus::Pending);
        let handle = JobHandle {
            job_id: Uuid::new_v4(),
            version_id,
            status: receiver,
            cancel: CancelToken::new(),
        };
        in_flight.insert(version_id, handle.clone());
        drop(in_flight);

        let pipeline = Arc::clone(&self.pipeline);
        let guard = InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
            version_id,
        };
        let cancel = handle.cancel.clone();
        let job_id = handle.job_id;

        tokio::task::spawn_blocking(move || {
            sender.send_replace(JobStatus::Running);
            info!(version = %version_id, job = %job_id, "profiling job started");

            let status = match pipeline.profile_version(version_id, &cancel) {
                Ok(profile) => JobStatus::Completed {
                    failures: profile.failures.len(),
                },
                Err(LensError::Cancelled) => JobStatus::Cancelled,
                Err(error) => {
                    warn!(version = %version_id, job = %job_id, error = %error, "profiling job failed");
                    JobStatus::Failed {
                        reason: error.to_string(),
                    }
                }
            };

            // Leave the table before publishing, so a caller woken by the
            // terminal status can submit a fresh job.
            drop(guard);
            info!(version = %version_id, job = %job_id, status = ?status, "profiling job finished");
            sender.send_replace(status);
        });

        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed { failures: 0 }.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(JobStatus::Failed { reason: String::new() }.is_terminal());
    }

    #[test]
    fn test_status_serializes_tagged() {
        let json = serde_json::to_string(&JobStatus::Completed { failures: 2 }).unwrap();
        assert_eq!(json, r#"{"state":"completed","failures":2}"#);
    }
}
