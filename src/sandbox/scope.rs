//! Scoped acquisition of a sandbox.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{info, warn};

use super::Sandbox;
use crate::error::Result;

/// Run `body` with `sandbox` and close the sandbox afterwards, whatever
/// `body` returned.
///
/// A close failure is reported only when the body itself succeeded; when
/// both fail the body's error wins and the close error is logged. A panic
/// in `body` is resumed after the sandbox is closed. If this future is
/// dropped before `body` finishes, the close is spawned onto the current
/// runtime.
pub async fn with_sandbox<F, Fut, T>(sandbox: Arc<dyn Sandbox>, body: F) -> Result<T>
where
    F: FnOnce(Arc<dyn Sandbox>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut guard = CloseOnDrop(Some(Arc::clone(&sandbox)));
    let outcome = AssertUnwindSafe(body(Arc::clone(&sandbox)))
        .catch_unwind()
        .await;
    guard.disarm();

    let closed = sandbox.close().await;
    info!(sandbox_id = sandbox.sandbox_id(), "sandbox closed");

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(panic) => {
            if let Err(close_err) = closed {
                warn!(error = %close_err, "failed to close sandbox after panic");
            }
            std::panic::resume_unwind(panic);
        }
    };

    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            warn!(error = %close_err, "failed to close sandbox after session error");
            Err(err)
        }
    }
}

/// Closes the sandbox in the background unless disarmed.
struct CloseOnDrop(Option<Arc<dyn Sandbox>>);

impl CloseOnDrop {
    fn disarm(&mut self) {
        self.0 = None;
    }
}

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        let Some(sandbox) = self.0.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(sandbox_id = sandbox.sandbox_id(), "sandbox scope cancelled, closing");
                handle.spawn(async move {
                    if let Err(err) = sandbox.close().await {
                        warn!(error = %err, "failed to close cancelled sandbox");
                    }
                });
            }
            Err(_) => warn!(
                sandbox_id = sandbox.sandbox_id(),
                "sandbox scope dropped outside a runtime, left open"
            ),
        }
    }
}
