//! Plugin descriptors.

use crate::{
    context::HookContext,
    handler::{Handler, SharedHandler, from_fn},
    outcome::IntoOutcome,
};
use std::fmt;

/// A namespace plus its table of hooks.
///
/// Hook keys are kept as written; the registry classifies them when the
/// plugin is registered. Registering a second handler under the same key
/// replaces the first.
///
/// # Example
///
/// ```rust,ignore
/// let plugin = Plugin::new("google-analytics")
///     .hook("trackStart", |ctx: HookContext| async move { json!({"source": "web"}) })
///     .hook("track", |ctx: HookContext| async move { send(ctx.payload).await })
///     .hook_fn("track:crm", |_ctx| json!({"via": "ga"}));
/// ```
#[derive(Clone)]
pub struct Plugin {
    namespace: String,
    hooks: Vec<(String, SharedHandler)>,
}

impl Plugin {
    /// Create a plugin with no hooks.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            hooks: Vec::new(),
        }
    }

    /// Attach a handler under `name`.
    pub fn hook<H: Handler>(mut self, name: impl Into<String>, handler: H) -> Self {
        self.insert(name.into(), SharedHandler::new(handler));
        self
    }

    /// Attach a synchronous function under `name`.
    pub fn hook_fn<F, Out>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(HookContext) -> Out + Send + Sync + 'static,
        Out: IntoOutcome,
    {
        self.hook(name, from_fn(f))
    }

    fn insert(&mut self, name: String, handler: SharedHandler) {
        match self.hooks.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = handler,
            None => self.hooks.push((name, handler)),
        }
    }

    /// The plugin's namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Iterate over `(hook name, handler)` pairs in insertion order.
    pub fn hooks(&self) -> impl Iterator<Item = (&str, &SharedHandler)> {
        self.hooks.iter().map(|(name, handler)| (name.as_str(), handler))
    }

    /// Whether a handler is attached under `name`.
    pub fn has_hook(&self, name: &str) -> bool {
        self.hooks.iter().any(|(existing, _)| existing == name)
    }

    /// Number of attached hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether the plugin has no hooks.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("namespace", &self.namespace)
            .field(
                "hooks",
                &self.hooks.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
