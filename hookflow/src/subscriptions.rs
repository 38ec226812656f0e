//! Listeners notified after a dispatch completes.

use hookflow_core::Payload;
use parking_lot::Mutex;
use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tracing::warn;

/// Subscribing to this action matches every action.
pub const WILDCARD: &str = "*";

/// Handle returned by [`Engine::on`](crate::Engine::on) and
/// [`Engine::once`](crate::Engine::once), used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&Payload) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    action: String,
    once: bool,
    listener: Listener,
}

impl Subscription {
    fn matches(&self, action: &str) -> bool {
        self.action == action || self.action == WILDCARD
    }
}

#[derive(Default)]
pub(crate) struct Subscriptions {
    next: AtomicU64,
    entries: Mutex<Vec<Subscription>>,
}

impl Subscriptions {
    pub(crate) fn add<F>(
        &self,
        action: impl Into<String>,
        once: bool,
        listener: F,
    ) -> SubscriptionId
    where
        F: Fn(&Payload) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().push(Subscription {
            id,
            action: action.into(),
            once,
            listener: Arc::new(listener),
        });
        id
    }

    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|sub| sub.id != id);
        entries.len() != before
    }

    /// Call every listener matching `action`, dropping fired `once` entries.
    ///
    /// Listeners run outside the lock, so they may subscribe or unsubscribe.
    pub(crate) fn notify(&self, action: &str, payload: &Payload) {
        let listeners: Vec<Listener> = {
            let mut entries = self.entries.lock();
            let matched = entries
                .iter()
                .filter(|sub| sub.matches(action))
                .map(|sub| Arc::clone(&sub.listener))
                .collect();
            entries.retain(|sub| !(sub.once && sub.matches(action)));
            matched
        };

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(payload))).is_err() {
                warn!(action, "Subscription listener panicked");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
