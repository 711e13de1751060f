//! Background profiling jobs.
//!
//! Profiling is CPU-bound, so each job runs on tokio's blocking pool and
//! callers keep a [`JobHandle`] to watch or cancel it. At most one job per
//! version is in flight: submitting a version that is already being
//! profiled returns a handle to the running job.

mod cancel;
mod runner;

pub use cancel::CancelToken;
pub use runner::{JobHandle, JobStatus, ProfilingJobs};
