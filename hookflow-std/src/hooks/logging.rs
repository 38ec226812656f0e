//! Logging wrapper for handler observation.

use hookflow_core::{BoxError, Handler, HandlerOutcome, HookContext};
use std::future::Future;
use tracing::{Instrument, debug, debug_span};

/// A handler wrapper that records each invocation with `tracing`.
///
/// The inner handler runs inside a `hook` span carrying the plugin namespace
/// and hook name; the outcome is logged at `debug` level.
#[derive(Debug, Clone)]
pub struct Logged<H> {
    inner: H,
}

impl<H> Logged<H> {
    /// Wrap a handler.
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    /// Unwrap the inner handler.
    pub fn into_inner(self) -> H {
        self.inner
    }
}

impl<H: Handler> Handler for Logged<H> {
    fn handle(
        &self,
        ctx: HookContext,
    ) -> impl Future<Output = Result<HandlerOutcome, BoxError>> + Send {
        let span = debug_span!("hook", namespace = %ctx.namespace, hook = %ctx.hook);
        let fut = self.inner.handle(ctx);
        async move {
            let result = fut.await;
            match &result {
                Ok(outcome) => debug!(changed = !outcome.is_no_change(), "Handler finished"),
                Err(error) => debug!(%error, "Handler returned an error"),
            }
            result
        }
        .instrument(span)
    }
}
