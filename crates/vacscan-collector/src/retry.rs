//! Retry with linear backoff for upstream requests.

use crate::error::{CollectError, Result};
use std::future::Future;
use std::time::Duration;
use vacscan_core::RetryConfig;

/// Retry behavior for a single upstream request.
///
/// Attempt `n` (0-based) that fails with a retryable error waits
/// `base_delay * (n + 1)` before the next attempt, multiplied by
/// `rate_limit_multiplier` when the failure was an HTTP 429. Non-retryable
/// errors are returned immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    rate_limit_multiplier: u32,
    attempt_timeout: Option<Duration>,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            rate_limit_multiplier: 1,
            attempt_timeout: None,
        }
    }

    /// A single attempt with no retries.
    #[must_use]
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    #[must_use]
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.base_delay_ms))
            .with_rate_limit_multiplier(u32::try_from(config.rate_limit_multiplier).unwrap_or(1))
    }

    #[must_use]
    pub fn with_rate_limit_multiplier(mut self, multiplier: u32) -> Self {
        self.rate_limit_multiplier = multiplier.max(1);
        self
    }

    /// Bound each attempt; an attempt that overruns fails with
    /// [`CollectError::Timeout`], which is retryable.
    #[must_use]
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after the failed 0-based `attempt`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, rate_limited: bool) -> Duration {
        let multiplier = if rate_limited {
            self.rate_limit_multiplier
        } else {
            1
        };
        self.base_delay * multiplier * (attempt + 1)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts are exhausted. `label` names the request in logs and timeouts.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            let outcome = match self.attempt_timeout {
                Some(timeout) => tokio::time::timeout(timeout, op())
                    .await
                    .unwrap_or_else(|_| {
                        Err(CollectError::Timeout {
                            url: label.to_string(),
                            timeout,
                        })
                    }),
                None => op().await,
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt + 1 < self.max_attempts => {
                    let delay = self.delay_for(attempt, e.is_rate_limited());
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}, retrying in {:?}...",
                        label,
                        attempt + 1,
                        self.max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
