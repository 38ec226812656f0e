//! Plugin registry.
//!
//! This module provides a builder for registering plugins and a frozen
//! registry that indexes every classified hook for dispatch.

use hookflow_core::{HookKind, HookName, Phase, Plugin, SharedHandler};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use thiserror::Error;
use tracing::{info, warn};

/// Errors raised while registering plugins.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A plugin with this namespace is already registered. The first
    /// registration is kept.
    #[error("plugin namespace `{0}` is already registered")]
    DuplicateNamespace(String),

    /// A plugin namespace was empty.
    #[error("plugin namespace is empty")]
    EmptyNamespace,
}

/// A handle for toggling a plugin's enabled state at runtime.
#[derive(Debug, Clone)]
pub struct EnabledHandle(Arc<AtomicBool>);

impl EnabledHandle {
    /// Create a new enabled handle with the given initial state.
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    /// Check if the plugin is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Enable the plugin.
    pub fn enable(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Disable the plugin.
    pub fn disable(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Set the plugin's enabled state, returning the previous one.
    pub fn set(&self, enabled: bool) -> bool {
        self.0.swap(enabled, Ordering::AcqRel)
    }
}

impl Default for EnabledHandle {
    fn default() -> Self {
        Self::new(true)
    }
}

/// One classified hook, ready to run.
#[derive(Debug, Clone)]
pub struct HookSlot {
    order: usize,
    namespace: Arc<str>,
    hook: HookName,
    handler: SharedHandler,
    enabled: EnabledHandle,
}

impl HookSlot {
    /// Registration order of the plugin that owns this hook.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Namespace of the plugin that owns this hook.
    pub fn namespace(&self) -> &Arc<str> {
        &self.namespace
    }

    /// The classified hook name.
    pub fn hook(&self) -> &HookName {
        &self.hook
    }

    /// The handler.
    pub fn handler(&self) -> &SharedHandler {
        &self.handler
    }

    /// Whether the owning plugin is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.is_enabled()
    }
}

/// A registered plugin with its classified hooks.
#[derive(Debug, Clone)]
pub struct PluginEntry {
    order: usize,
    namespace: Arc<str>,
    enabled: EnabledHandle,
    hooks: Vec<HookSlot>,
}

impl PluginEntry {
    fn classify(order: usize, plugin: &Plugin, enabled: bool) -> Self {
        let namespace: Arc<str> = Arc::from(plugin.namespace());
        let enabled = EnabledHandle::new(enabled);

        let mut hooks = Vec::with_capacity(plugin.len());
        for (name, handler) in plugin.hooks() {
            match HookName::parse(name) {
                Ok(hook) => hooks.push(HookSlot {
                    order,
                    namespace: Arc::clone(&namespace),
                    hook,
                    handler: handler.clone(),
                    enabled: enabled.clone(),
                }),
                Err(error) => {
                    warn!(namespace = %namespace, hook = %name, %error, "Skipping invalid hook");
                }
            }
        }

        Self {
            order,
            namespace,
            enabled,
            hooks,
        }
    }

    /// Registration order (0-based).
    pub fn order(&self) -> usize {
        self.order
    }

    /// The plugin's namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Every hook the plugin defines, classified.
    pub fn hooks(&self) -> &[HookSlot] {
        &self.hooks
    }

    /// Check if the plugin is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.is_enabled()
    }

    /// Get a handle for toggling this plugin's enabled state at runtime.
    pub fn enabled_handle(&self) -> EnabledHandle {
        self.enabled.clone()
    }
}

// ============================================================================
// RegistryBuilder - for constructing registries
// ============================================================================

/// Builder for constructing a [`Registry`].
///
/// Register plugins in the order they should run, then call `.build()` to
/// create an immutable registry.
///
/// # Example
/// ```ignore
/// let registry = RegistryBuilder::new()
///     .register(Plugin::new("ga").hook("track", send))
///     .register(Plugin::new("crm").hook("identify", sync_user))
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: Vec<PluginEntry>,
}

impl RegistryBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a plugin, dropping it with a warning if its namespace is
    /// already taken.
    pub fn register(mut self, plugin: Plugin) -> Self {
        if let Err(error) = self.try_register(plugin) {
            warn!(%error, "Plugin rejected");
        }
        self
    }

    /// Register a plugin, reporting a duplicate namespace to the caller.
    ///
    /// The first registration of a namespace wins.
    pub fn try_register(&mut self, plugin: Plugin) -> Result<(), RegistryError> {
        self.try_register_with(plugin, true)
    }

    /// Register a plugin with an initial enabled state.
    pub fn try_register_with(
        &mut self,
        plugin: Plugin,
        enabled: bool,
    ) -> Result<(), RegistryError> {
        if plugin.namespace().is_empty() {
            return Err(RegistryError::EmptyNamespace);
        }
        if self.contains(plugin.namespace()) {
            return Err(RegistryError::DuplicateNamespace(
                plugin.namespace().to_string(),
            ));
        }

        let entry = PluginEntry::classify(self.entries.len(), &plugin, enabled);
        info!(
            namespace = %entry.namespace,
            order = entry.order,
            hooks = entry.hooks.len(),
            "Plugin registered"
        );
        self.entries.push(entry);
        Ok(())
    }

    /// Whether a namespace has been registered.
    pub fn contains(&self, namespace: &str) -> bool {
        self.entries.iter().any(|e| &*e.namespace == namespace)
    }

    /// Build the immutable Registry.
    pub fn build(self) -> Registry {
        Registry::index(self.entries)
    }

    /// Get the number of registered plugins.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the builder has no plugins.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Registry - immutable hook index
// ============================================================================

/// Every hook registered for one action, split by kind.
#[derive(Debug, Clone, Default)]
pub struct ActionHooks {
    start: Vec<HookSlot>,
    complete: Vec<HookSlot>,
    delivery: Vec<HookSlot>,
    targeted: HashMap<String, Vec<HookSlot>>,
}

impl ActionHooks {
    /// Phase hooks in registration order.
    pub fn phase(&self, phase: Phase) -> &[HookSlot] {
        match phase {
            Phase::Start => &self.start,
            Phase::Complete => &self.complete,
        }
    }

    /// Delivery hooks in registration order.
    pub fn delivery(&self) -> &[HookSlot] {
        &self.delivery
    }

    /// Enrichment hooks aimed at `target`, in the registration order of the
    /// plugins contributing them.
    pub fn targeted(&self, target: &str) -> &[HookSlot] {
        self.targeted.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    fn push(&mut self, slot: HookSlot) {
        match slot.hook.kind().clone() {
            HookKind::Phase(Phase::Start) => self.start.push(slot),
            HookKind::Phase(Phase::Complete) => self.complete.push(slot),
            HookKind::Delivery => self.delivery.push(slot),
            HookKind::Targeted(target) => self.targeted.entry(target).or_default().push(slot),
        }
    }

    fn sort(&mut self) {
        self.start.sort_by_key(HookSlot::order);
        self.complete.sort_by_key(HookSlot::order);
        self.delivery.sort_by_key(HookSlot::order);
        for slots in self.targeted.values_mut() {
            slots.sort_by_key(HookSlot::order);
        }
    }
}

/// An immutable registry of plugins and their classified hooks.
///
/// Created by [`RegistryBuilder::build`]. Appending a plugin produces a new
/// registry via [`Registry::with_plugin`]; existing snapshots are never
/// modified, so an in-flight dispatch keeps the plugin set it started with.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<PluginEntry>,
    namespaces: Arc<[String]>,
    actions: HashMap<String, ActionHooks>,
}

impl Registry {
    fn index(entries: Vec<PluginEntry>) -> Self {
        let mut actions: HashMap<String, ActionHooks> = HashMap::new();
        for slot in entries.iter().flat_map(|e| e.hooks.iter()) {
            actions
                .entry(slot.hook.action().to_string())
                .or_default()
                .push(slot.clone());
        }
        for hooks in actions.values_mut() {
            hooks.sort();
        }

        let namespaces = entries.iter().map(|e| e.namespace.to_string()).collect();
        Self {
            entries,
            namespaces,
            actions,
        }
    }

    /// A new registry with `plugin` appended after every existing plugin.
    pub fn with_plugin(&self, plugin: Plugin) -> Result<Registry, RegistryError> {
        let mut builder = RegistryBuilder {
            entries: self.entries.clone(),
        };
        builder.try_register(plugin)?;
        Ok(builder.build())
    }

    /// Hooks registered for `action`, if any.
    pub fn action(&self, action: &str) -> Option<&ActionHooks> {
        self.actions.get(action)
    }

    /// Every namespace, in registration order.
    pub fn namespaces(&self) -> &Arc<[String]> {
        &self.namespaces
    }

    /// Look up a plugin by namespace.
    pub fn plugin(&self, namespace: &str) -> Option<&PluginEntry> {
        self.entries.iter().find(|e| &*e.namespace == namespace)
    }

    /// Iterate over plugins in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &PluginEntry> {
        self.entries.iter()
    }

    /// Get the number of registered plugins.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
