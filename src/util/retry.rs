//! Retry with exponential backoff and jitter.

use std::future::Future;
use std::time::Duration;

use crate::error::{EdaError, Result};

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Execute an async operation, retrying only retryable errors.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if !err.is_retryable() || attempt >= self.max_attempts.max(1) {
                return Err(err);
            }

            tracing::warn!(
                attempt,
                max_attempts = self.max_attempts,
                error = %err,
                "Retrying after error"
            );

            // Jitter: 75%–125% of backoff, but never shorter than a server hint.
            let jitter_factor = 0.75 + (rand_factor() * 0.5);
            let mut sleep_for = Duration::from_secs_f64(backoff.as_secs_f64() * jitter_factor);
            if let EdaError::RateLimited {
                retry_after_ms: Some(ms),
            } = err
            {
                sleep_for = sleep_for.max(Duration::from_millis(ms).min(self.max_backoff));
            }
            tokio::time::sleep(sleep_for).await;

            backoff = Duration::from_secs_f64(
                (backoff.as_secs_f64() * self.multiplier).min(self.max_backoff.as_secs_f64()),
            );
        }
    }
}

/// Pseudo-random factor in [0, 1) derived from the clock.
fn rand_factor() -> f64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
        .hash(&mut hasher);
    std::thread::current().id().hash(&mut hasher);

    (hasher.finish() % 10_000) as f64 / 10_000.0
}
