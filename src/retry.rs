//! Deadline and bounded retry for calls that leave the process.
//!
//! Every attempt runs under the policy's timeout. Failed attempts are
//! retried up to `max_retries` times with exponential, jittered backoff.
//! The default policy makes exactly one attempt.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::{Result, TickerError};

/// Default per-attempt deadline.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Backoff before the first retry.
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Upper bound on any single backoff.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Timeout and retry settings applied around one external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    timeout: Duration,
    max_retries: u32,
    max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, 0)
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        Self {
            timeout,
            max_retries,
            max_backoff: MAX_BACKOFF,
        }
    }

    /// Keeps every backoff under half of `interval` so retries finish
    /// before the next scheduled tick.
    #[must_use]
    pub fn within(mut self, interval: Duration) -> Self {
        self.max_backoff = self.max_backoff.min(interval / 2);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Runs `op` under the deadline, retrying failures per the policy.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's error, or [`TickerError::Timeout`] when
    /// the last attempt ran out of time.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            let outcome = match tokio::time::timeout(self.timeout, op()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(TickerError::Timeout(self.timeout)),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_retries => {
                    let delay = self.backoff(attempt);
                    debug!(
                        what,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying after error: {e}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Exponential backoff for `attempt` plus up to 50% random jitter,
    /// capped at `max_backoff`.
    fn backoff(&self, attempt: u32) -> Duration {
        let base = INITIAL_BACKOFF
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_backoff);
        let jitter_ms = rand::random_range(0..=base.as_millis() as u64 / 2);
        (base + Duration::from_millis(jitter_ms)).min(self.max_backoff)
    }
}
