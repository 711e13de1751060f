//! Retry with exponential backoff at the storage boundary.

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ObjectStore, StorageResult};

/// How transient storage failures are retried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound for any single delay, in milliseconds.
    pub max_backoff_ms: u64,
    /// Factor applied to the delay after each retry.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 50,
            max_backoff_ms: 2_000,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let millis = self.initial_backoff_ms as f64 * self.multiplier.max(1.0).powi(exponent);
        let capped = millis.min(self.max_backoff_ms as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }
}

/// Wraps a store and retries operations that fail transiently.
///
/// Only [`StorageError::Transient`](crate::StorageError::Transient) is retried;
/// missing objects and backend failures are returned at once.
#[derive(Debug)]
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: ObjectStore> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn retry<T>(
        &self,
        operation: &'static str,
        key: &str,
        mut attempt: impl FnMut() -> StorageResult<T>,
    ) -> StorageResult<T> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut tries = 1;
        loop {
            match attempt() {
                Err(error) if error.is_transient() && tries < max_attempts => {
                    let delay = self.policy.backoff(tries);
                    warn!(
                        operation,
                        key,
                        attempt = tries,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "retrying storage operation"
                    );
                    thread::sleep(delay);
                    tries += 1;
                }
                result => return result,
            }
        }
    }
}

impl<S: ObjectStore> ObjectStore for RetryingStore<S> {
    fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.retry("get", key, || self.inner.get(key))
    }

    fn put(&self, key: &str, bytes: &[u8]) -> StorageResult<String> {
        self.retry("put", key, || self.inner.put(key, bytes))
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.retry("delete", key, || self.inner.delete(key))
    }
}
