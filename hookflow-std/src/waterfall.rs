//! Waterfall executor.
//!
//! A waterfall threads one payload through an ordered list of hook slots.
//! Each step sees exactly the payload produced (or preserved) by the step
//! before it; a non-empty result is shallow-merged into the running payload.

use crate::registry::HookSlot;
use futures::FutureExt;
use hookflow_core::{FailureKind, HandlerFailure, HandlerOutcome, HookContext, Instance, Payload};
use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};
use tracing::{trace, warn};

/// What to do when a handler fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Report the failure and carry on with the pre-failure payload.
    #[default]
    Isolate,
    /// Abort the dispatch with the first failure.
    FailFast,
}

impl FailurePolicy {
    /// Record `failure` under this policy.
    ///
    /// Under `Isolate` the failure is logged and pushed onto `failures`;
    /// under `FailFast` it is handed back to abort the dispatch.
    pub fn absorb(
        self,
        failure: HandlerFailure,
        failures: &mut Vec<HandlerFailure>,
    ) -> Result<(), HandlerFailure> {
        match self {
            FailurePolicy::Isolate => {
                warn!(
                    namespace = %failure.namespace,
                    hook = %failure.hook,
                    error = %failure.kind,
                    "Handler failed; continuing with previous payload"
                );
                failures.push(failure);
                Ok(())
            }
            FailurePolicy::FailFast => Err(failure),
        }
    }
}

/// Invoke the handler in `slot`, converting errors and panics into a
/// [`HandlerFailure`] attributed to the slot's plugin and hook.
pub async fn invoke(slot: &HookSlot, ctx: HookContext) -> Result<HandlerOutcome, HandlerFailure> {
    // The call itself may run plugin code before the first poll.
    let result = AssertUnwindSafe(async move { slot.handler().call(ctx).await })
        .catch_unwind()
        .await;

    let kind = match result {
        Ok(Ok(outcome)) => return Ok(outcome),
        Ok(Err(error)) => FailureKind::Error(error),
        Err(panic) => FailureKind::Panic(panic_message(panic)),
    };
    Err(HandlerFailure::new(
        &**slot.namespace(),
        slot.hook().as_str(),
        kind,
    ))
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// The shared part of every handler context in one dispatch.
#[derive(Debug, Clone)]
pub struct Waterfall {
    plugins: Arc<[String]>,
    instance: Arc<Instance>,
    policy: FailurePolicy,
}

impl Waterfall {
    /// Create an executor for one dispatch.
    pub fn new(plugins: Arc<[String]>, instance: Arc<Instance>, policy: FailurePolicy) -> Self {
        Self {
            plugins,
            instance,
            policy,
        }
    }

    /// The failure policy in effect.
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Build the context handed to the handler in `slot`.
    pub fn context(&self, slot: &HookSlot, payload: Payload) -> HookContext {
        HookContext {
            payload,
            plugins: Arc::clone(&self.plugins),
            instance: Arc::clone(&self.instance),
            hook: slot.hook().clone(),
            namespace: Arc::clone(slot.namespace()),
        }
    }

    /// Reduce `payload` through `steps`, in order.
    ///
    /// Steps owned by disabled plugins are skipped. A failing step leaves the
    /// payload as it was before that step; isolated failures are appended to
    /// `failures`.
    pub async fn reduce<'s, I>(
        &self,
        steps: I,
        payload: Payload,
        failures: &mut Vec<HandlerFailure>,
    ) -> Result<Payload, HandlerFailure>
    where
        I: IntoIterator<Item = &'s HookSlot>,
    {
        let mut current = payload;
        for slot in steps {
            if !slot.is_enabled() {
                trace!(
                    namespace = %slot.namespace(),
                    hook = %slot.hook(),
                    "Skipping disabled plugin"
                );
                continue;
            }

            let step = invoke(slot, self.context(slot, current.clone()))
                .await
                .and_then(|outcome| {
                    outcome.apply(&current).map_err(|malformed| {
                        HandlerFailure::new(
                            &**slot.namespace(),
                            slot.hook().as_str(),
                            FailureKind::Malformed(malformed),
                        )
                    })
                });

            match step {
                Ok(next) => {
                    trace!(namespace = %slot.namespace(), hook = %slot.hook(), "Step applied");
                    current = next;
                }
                Err(failure) => self.policy.absorb(failure, failures)?,
            }
        }
        Ok(current)
    }
}
