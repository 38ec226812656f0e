#![allow(dead_code)]

use hookflow::{HookContext, Payload, Plugin, testing::Recorder};
use serde_json::{Value, json};
use std::sync::Once;

// ============================================================================
// Tracing
// ============================================================================

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
/// Filter with `RUST_LOG=hookflow=trace`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Plugins
// ============================================================================

/// A plugin whose `hook` always merges `patch`.
pub fn patching(namespace: &str, hook: &str, patch: Value) -> Plugin {
    Plugin::new(namespace).hook_fn(hook, move |_ctx: HookContext| patch.clone())
}

/// A plugin whose `hook` records every payload it sees.
pub fn recording(namespace: &str, hook: &str) -> (Plugin, Recorder) {
    let recorder = Recorder::new();
    (Plugin::new(namespace).hook(hook, recorder.clone()), recorder)
}

/// A plugin whose delivery hook records its input and tries to leak `patch`.
pub fn leaking(namespace: &str, action: &str, patch: Value) -> (Plugin, Recorder) {
    let recorder = Recorder::returning(hookflow::HandlerOutcome::Merge(patch));
    (Plugin::new(namespace).hook(action, recorder.clone()), recorder)
}

// ============================================================================
// Assertions
// ============================================================================

/// The payload as JSON, without `meta`.
pub fn stripped(payload: &Payload) -> Value {
    payload.without_meta().into_value()
}

/// Shorthand for the `foo: "baz"` patch used across scenarios.
pub fn foo_baz() -> Value {
    json!({"foo": "baz"})
}
