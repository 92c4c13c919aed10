//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::{EdaError, Result};

/// Wrap a future with a timeout, mapping expiry to [`EdaError::Timeout`].
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(EdaError::Timeout(duration.as_millis() as u64)),
    }
}
