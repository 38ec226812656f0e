//! Timeout wrapper for time-limited handlers.

use hookflow_core::{BoxError, Handler, HandlerOutcome, HookContext};
use std::{future::Future, time::Duration};
use thiserror::Error;

/// Error returned when a handler times out.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("handler timed out after {0:?}")]
pub struct TimeoutError(pub Duration);

/// A handler wrapper that fails the invocation if the inner handler takes
/// longer than `duration`.
///
/// The engine itself never times handlers out; wrap the ones that talk to
/// slow collaborators. A timed-out step is reported like any other handler
/// failure.
#[derive(Debug, Clone)]
pub struct Timeout<H> {
    inner: H,
    duration: Duration,
}

impl<H> Timeout<H> {
    /// Create a new timeout wrapper.
    pub fn new(inner: H, duration: Duration) -> Self {
        Self { inner, duration }
    }
}

impl<H: Handler> Handler for Timeout<H> {
    fn handle(
        &self,
        ctx: HookContext,
    ) -> impl Future<Output = Result<HandlerOutcome, BoxError>> + Send {
        let duration = self.duration;
        let fut = self.inner.handle(ctx);
        async move {
            match tokio::time::timeout(duration, fut).await {
                Ok(result) => result,
                Err(_) => Err(Box::new(TimeoutError(duration)) as BoxError),
            }
        }
    }
}
