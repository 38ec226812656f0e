//! The per-dispatch state machine.
//!
//! ```text
//! Seeded -> StartPhase -> DeliveryPhase -> CompletePhase -> Done
//! ```
//!
//! Each phase fully completes before the next begins. A fail-fast failure
//! jumps straight out of whichever phase it happened in.

use crate::config::{DeliveryMode, EngineConfig};
use hookflow_core::{HandlerFailure, Instance, Payload, Phase};
use hookflow_std::{
    ActionHooks, ConcurrentDelivery, DeliveryStrategy, DeliveryTarget, Registry,
    SequentialDelivery, Waterfall,
};
use std::{fmt, sync::Arc};
use tracing::{debug, trace};

/// The result of a dispatch that ran to completion.
#[derive(Debug)]
pub struct Dispatched {
    /// The payload after the complete phase.
    pub payload: Payload,
    /// Handler failures that were isolated along the way, in the order they
    /// happened.
    pub failures: Vec<HandlerFailure>,
}

impl Dispatched {
    /// Whether every handler succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Discard the failure report.
    pub fn into_payload(self) -> Payload {
        self.payload
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Seeded,
    StartPhase,
    DeliveryPhase,
    CompletePhase,
    Done,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Seeded => "seeded",
            Self::StartPhase => "start",
            Self::DeliveryPhase => "delivery",
            Self::CompletePhase => "complete",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Runs one dispatch against a registry snapshot.
pub(crate) struct Orchestrator<'r> {
    registry: &'r Registry,
    waterfall: Waterfall,
    delivery: DeliveryMode,
}

impl<'r> Orchestrator<'r> {
    pub(crate) fn new(
        registry: &'r Registry,
        instance: Arc<Instance>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            registry,
            waterfall: Waterfall::new(
                Arc::clone(registry.namespaces()),
                instance,
                config.failure_policy,
            ),
            delivery: config.delivery_mode,
        }
    }

    pub(crate) async fn run(
        &self,
        action: &str,
        seed: Payload,
    ) -> Result<Dispatched, HandlerFailure> {
        let mut failures = Vec::new();
        enter(State::Seeded);

        let Some(hooks) = self.registry.action(action) else {
            debug!(action, "No hooks registered for action");
            enter(State::Done);
            return Ok(Dispatched {
                payload: seed,
                failures,
            });
        };

        enter(State::StartPhase);
        let ready = self
            .phase(Phase::Start, action, hooks, seed, &mut failures)
            .await?;

        enter(State::DeliveryPhase);
        let targets = targets(hooks);
        let delivered = match self.delivery {
            DeliveryMode::Sequential => {
                SequentialDelivery
                    .deliver(&self.waterfall, targets, &ready)
                    .await?
            }
            DeliveryMode::Concurrent => {
                ConcurrentDelivery
                    .deliver(&self.waterfall, targets, &ready)
                    .await?
            }
        };
        failures.extend(delivered);

        enter(State::CompletePhase);
        let payload = self
            .phase(Phase::Complete, action, hooks, ready, &mut failures)
            .await?;

        enter(State::Done);
        Ok(Dispatched { payload, failures })
    }

    /// Run one phase waterfall. Handlers see `type` set to the phase hook
    /// name; the action is restored on the way out.
    async fn phase(
        &self,
        phase: Phase,
        action: &str,
        hooks: &ActionHooks,
        payload: Payload,
        failures: &mut Vec<HandlerFailure>,
    ) -> Result<Payload, HandlerFailure> {
        let steps = hooks.phase(phase);
        if steps.is_empty() {
            return Ok(payload);
        }

        let staged = payload.with_type(&phase.hook_name(action));
        let reduced = self.waterfall.reduce(steps, staged, failures).await?;
        Ok(reduced.with_type(action))
    }
}

/// One target per enabled plugin that defines the bare action hook.
fn targets(hooks: &ActionHooks) -> Vec<DeliveryTarget<'_>> {
    hooks
        .delivery()
        .iter()
        .filter(|slot| slot.is_enabled())
        .map(|slot| DeliveryTarget {
            delivery: slot,
            enrichments: hooks.targeted(slot.namespace()),
        })
        .collect()
}

fn enter(state: State) {
    trace!(%state, "Dispatch state");
}
