//! Delivery strategies.
//!
//! The delivery phase hands each plugin its own target payload: the ready
//! payload run through the enrichment hooks aimed at that plugin. Whatever
//! the delivery handler returns is discarded, so no delivery can influence
//! another plugin's payload. Returns that are not mergeable are still
//! reported as malformed.

use crate::{
    registry::HookSlot,
    waterfall::{Waterfall, invoke},
};
use futures::future::join_all;
use hookflow_core::{FailureKind, HandlerFailure, Payload};
use std::future::Future;
use tracing::{debug, trace};

/// One plugin's delivery: its handler plus the enrichment hooks aimed at it.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryTarget<'a> {
    /// The plugin's `<action>` hook.
    pub delivery: &'a HookSlot,
    /// Every `<action>:<namespace>` hook targeting the plugin, in the
    /// contributors' registration order.
    pub enrichments: &'a [HookSlot],
}

impl DeliveryTarget<'_> {
    /// Build the target payload and invoke the delivery handler with it.
    ///
    /// A patch returned by the delivery handler is discarded. A return value
    /// that could not have been merged is still reported as malformed.
    pub async fn run(
        &self,
        waterfall: &Waterfall,
        ready: &Payload,
        failures: &mut Vec<HandlerFailure>,
    ) -> Result<(), HandlerFailure> {
        let target = waterfall
            .reduce(self.enrichments, ready.clone(), failures)
            .await?;

        let ctx = waterfall.context(self.delivery, target.clone());
        let delivered = invoke(self.delivery, ctx).await.and_then(|outcome| {
            outcome.apply(&target).map(|_| outcome).map_err(|malformed| {
                HandlerFailure::new(
                    &**self.delivery.namespace(),
                    self.delivery.hook().as_str(),
                    FailureKind::Malformed(malformed),
                )
            })
        });

        match delivered {
            Ok(outcome) => {
                trace!(
                    namespace = %self.delivery.namespace(),
                    discarded = !outcome.is_no_change(),
                    "Delivered"
                );
                Ok(())
            }
            Err(failure) => waterfall.policy().absorb(failure, failures),
        }
    }
}

/// Strategy for running the delivery phase over a set of targets.
///
/// This abstraction allows different execution models (sequential,
/// concurrent) to be plugged into the orchestrator. Every strategy must
/// finish all deliveries before returning.
pub trait DeliveryStrategy: Send + Sync {
    /// Deliver to every target, returning the isolated failures in target
    /// order.
    fn deliver<'a>(
        &'a self,
        waterfall: &'a Waterfall,
        targets: Vec<DeliveryTarget<'a>>,
        ready: &'a Payload,
    ) -> impl Future<Output = Result<Vec<HandlerFailure>, HandlerFailure>> + Send + 'a;
}

/// A sequential delivery strategy.
///
/// Delivers to one plugin at a time, in registration order.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialDelivery;

impl DeliveryStrategy for SequentialDelivery {
    async fn deliver<'a>(
        &'a self,
        waterfall: &'a Waterfall,
        targets: Vec<DeliveryTarget<'a>>,
        ready: &'a Payload,
    ) -> Result<Vec<HandlerFailure>, HandlerFailure> {
        let mut failures = Vec::new();
        for target in targets {
            target.run(waterfall, ready, &mut failures).await?;
        }
        Ok(failures)
    }
}

/// A concurrent delivery strategy.
///
/// Runs every target's enrichment waterfall and delivery concurrently and
/// waits for all of them. Failures are still reported in target order.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConcurrentDelivery;

impl DeliveryStrategy for ConcurrentDelivery {
    async fn deliver<'a>(
        &'a self,
        waterfall: &'a Waterfall,
        targets: Vec<DeliveryTarget<'a>>,
        ready: &'a Payload,
    ) -> Result<Vec<HandlerFailure>, HandlerFailure> {
        debug!(targets = targets.len(), "Delivering concurrently");
        let runs = targets.into_iter().map(|target| async move {
            let mut failures = Vec::new();
            target
                .run(waterfall, ready, &mut failures)
                .await
                .map(|()| failures)
        });

        let mut failures = Vec::new();
        for result in join_all(runs).await {
            failures.extend(result?);
        }
        Ok(failures)
    }
}
