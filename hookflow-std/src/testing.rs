//! Testing utilities for hookflow.
//!
//! This module provides handlers that make plugin pipelines easy to inspect.
//!
//! # Features
//!
//! - [`Recorder`]: A handler that records every payload it receives
//! - [`CallLog`]: A shared log recording the order handlers ran in
//! - [`returning`], [`failing`], [`panicking`]: fixed-behavior handlers

use hookflow_core::{BoxError, Handler, HandlerOutcome, HookContext, Payload, from_fn};
use parking_lot::Mutex;
use serde_json::Value;
use std::{future::Future, sync::Arc};

// ============================================================================
// Recorder
// ============================================================================

/// A handler that records every payload it receives.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = Recorder::new();
/// let plugin = Plugin::new("dest").hook("track", recorder.clone());
///
/// // dispatch...
///
/// assert_eq!(recorder.count(), 1);
/// assert_eq!(recorder.last().unwrap().get_str("event"), Some("signup"));
/// ```
#[derive(Clone, Default)]
pub struct Recorder {
    payloads: Arc<Mutex<Vec<Payload>>>,
    outcome: HandlerOutcome,
}

impl Recorder {
    /// Create a recorder that leaves payloads untouched.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorder that answers every call with `outcome`.
    pub fn returning(outcome: HandlerOutcome) -> Self {
        Self {
            payloads: Arc::default(),
            outcome,
        }
    }

    /// Get a clone of the recorded payloads.
    pub fn payloads(&self) -> Vec<Payload> {
        self.payloads.lock().clone()
    }

    /// The most recent payload.
    pub fn last(&self) -> Option<Payload> {
        self.payloads.lock().last().cloned()
    }

    /// Get the number of recorded calls.
    pub fn count(&self) -> usize {
        self.payloads.lock().len()
    }

    /// Clear all recorded payloads.
    pub fn clear(&self) {
        self.payloads.lock().clear();
    }
}

impl Handler for Recorder {
    fn handle(
        &self,
        ctx: HookContext,
    ) -> impl Future<Output = Result<HandlerOutcome, BoxError>> + Send {
        self.payloads.lock().push(ctx.payload);
        std::future::ready(Ok(self.outcome.clone()))
    }
}

// ============================================================================
// Call Log
// ============================================================================

/// A shared log of handler invocations, in the order they happened.
#[derive(Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler that appends `label` and leaves the payload untouched.
    pub fn handler<S: Into<String>>(&self, label: S) -> impl Handler + use<S> {
        let entries = Arc::clone(&self.entries);
        let label = label.into();
        from_fn(move |_ctx: HookContext| entries.lock().push(label.clone()))
    }

    /// Get a clone of the recorded labels.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

// ============================================================================
// Fixed-behavior handlers
// ============================================================================

/// A handler that always merges `patch`.
pub fn returning(patch: Value) -> impl Handler {
    from_fn(move |_ctx: HookContext| HandlerOutcome::Merge(patch.clone()))
}

/// A handler that always fails with `message`.
pub fn failing(message: &'static str) -> impl Handler {
    from_fn(move |_ctx: HookContext| -> Result<(), BoxError> { Err(message.into()) })
}

/// A handler that always panics with `message`.
pub fn panicking(message: &'static str) -> impl Handler {
    from_fn(move |_ctx: HookContext| -> () { panic!("{message}") })
}
