use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::error::RetryError;
use crate::constants::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_INTERVAL};

/// Fixed-interval retry policy for collaborator calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_INTERVAL)
    }
}

impl RetryPolicy {
    /// At least one attempt is always made.
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Runs `operation` until it succeeds or `policy.max_attempts()` attempts have
/// failed, sleeping `policy.interval()` between attempts.
///
/// The closure receives the one-based attempt number. There is no sleep after
/// the final failure.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= policy.max_attempts => {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: e,
                });
            }
            Err(e) => {
                warn!(
                    label,
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %e,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(policy.interval).await;
            }
        }
    }
}
