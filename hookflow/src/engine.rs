//! The engine facade.

use crate::{
    config::{DeliveryMode, EngineConfig},
    error::EngineError,
    identity::Identity,
    orchestrator::{Dispatched, Orchestrator},
    subscriptions::{SubscriptionId, Subscriptions},
};
use hookflow_core::{Instance, Payload, Plugin, User};
use hookflow_std::{
    Clock, FailurePolicy, PageData, PayloadBuilder, Registry, RegistryBuilder, RegistryError,
    SeedError, SeedInput, SeedRule, actions,
};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::{fmt, sync::Arc};
use tracing::{Instrument, debug, info, info_span};

// ============================================================================
// EngineBuilder
// ============================================================================

/// Builder for [`Engine`].
///
/// # Example
///
/// ```rust,ignore
/// let engine = Engine::builder()
///     .app("shop")
///     .plugin(Plugin::new("console").hook_fn("track", |ctx: HookContext| {
///         println!("{:?}", ctx.payload);
///     }))
///     .build();
///
/// engine.track("signup", None, None).await?;
/// ```
#[derive(Debug, Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    registry: RegistryBuilder,
    seeds: Option<PayloadBuilder>,
}

impl EngineBuilder {
    /// Create a builder with default configuration and no plugins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the application name.
    pub fn app(mut self, app: impl Into<String>) -> Self {
        self.config = self.config.with_app(app);
        self
    }

    /// Set the application version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config = self.config.with_version(version);
        self
    }

    /// Set what a handler failure does to the rest of its dispatch.
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config = self.config.with_failure_policy(policy);
        self
    }

    /// Set how the delivery phase schedules plugins.
    pub fn delivery_mode(mut self, mode: DeliveryMode) -> Self {
        self.config = self.config.with_delivery_mode(mode);
        self
    }

    /// Register a plugin.
    ///
    /// A plugin whose namespace is empty or already taken is rejected with a
    /// warning and the first registration stays in place. Use
    /// [`try_plugin`](Self::try_plugin) to observe the rejection.
    pub fn plugin(mut self, plugin: Plugin) -> Self {
        self.registry = self.registry.register(plugin);
        self
    }

    /// Register several plugins, in order.
    pub fn plugins(self, plugins: impl IntoIterator<Item = Plugin>) -> Self {
        plugins.into_iter().fold(self, Self::plugin)
    }

    /// Register a plugin, returning the rejection if there is one.
    pub fn try_plugin(&mut self, plugin: Plugin) -> Result<(), RegistryError> {
        self.registry.try_register(plugin)
    }

    /// Override or add the seed rule for `action`.
    pub fn seed_rule(mut self, action: impl Into<String>, rule: impl SeedRule) -> Self {
        let seeds = self.seeds.take().unwrap_or_else(PayloadBuilder::standard);
        self.seeds = Some(seeds.rule(action, rule));
        self
    }

    /// Freeze the registry and build the engine.
    pub fn build(self) -> Engine {
        let registry = self.registry.build();
        info!(
            plugins = registry.len(),
            app = ?self.config.app,
            "Engine built"
        );
        Engine {
            inner: Arc::new(EngineInner {
                config: self.config,
                registry: RwLock::new(Arc::new(registry)),
                seeds: self.seeds.unwrap_or_else(PayloadBuilder::standard),
                identity: Identity::new(),
                subscriptions: Subscriptions::default(),
                clock: Clock::new(),
            }),
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// The dispatch engine.
///
/// Cheap to clone; clones share registry, identity and subscriptions.
/// Concurrent dispatches are independent of one another: each runs against
/// the registry snapshot taken when it started.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: EngineConfig,
    registry: RwLock<Arc<Registry>>,
    seeds: PayloadBuilder,
    identity: Identity,
    subscriptions: Subscriptions,
    clock: Clock,
}

impl Engine {
    /// Start building an engine.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// An engine with default configuration and the given plugins.
    pub fn new(plugins: impl IntoIterator<Item = Plugin>) -> Self {
        Self::builder().plugins(plugins).build()
    }

    /// The configuration the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// The current registry snapshot.
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.inner.registry.read())
    }

    /// Registered namespaces, in registration order.
    pub fn plugins(&self) -> Vec<String> {
        self.registry().namespaces().to_vec()
    }

    /// Append a plugin after construction.
    ///
    /// Dispatches already in flight keep the snapshot they started with.
    pub fn add_plugin(&self, plugin: Plugin) -> Result<(), EngineError> {
        let mut current = self.inner.registry.write();
        let next = current.with_plugin(plugin)?;
        *current = Arc::new(next);
        Ok(())
    }

    /// Re-enable a disabled plugin.
    pub fn enable_plugin(&self, namespace: &str) -> Result<(), EngineError> {
        self.set_enabled(namespace, true)
    }

    /// Skip a plugin in every phase until it is re-enabled.
    ///
    /// The plugin keeps its namespace and position in the registry.
    pub fn disable_plugin(&self, namespace: &str) -> Result<(), EngineError> {
        self.set_enabled(namespace, false)
    }

    /// Whether the plugin is enabled, or `None` if it is not registered.
    pub fn is_enabled(&self, namespace: &str) -> Option<bool> {
        self.registry().plugin(namespace).map(|entry| entry.is_enabled())
    }

    fn set_enabled(&self, namespace: &str, enabled: bool) -> Result<(), EngineError> {
        let registry = self.registry();
        let entry = registry
            .plugin(namespace)
            .ok_or_else(|| EngineError::UnknownPlugin(namespace.to_string()))?;
        let previous = entry.enabled_handle().set(enabled);
        if previous != enabled {
            info!(namespace, enabled, "Plugin toggled");
        }
        Ok(())
    }

    /// A snapshot of the current identity.
    pub fn user(&self) -> User {
        self.inner.identity.snapshot()
    }

    // ------------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------------

    /// Call `listener` with the final payload of every completed dispatch of
    /// `action`. `"*"` matches every action.
    pub fn on<F>(&self, action: impl Into<String>, listener: F) -> SubscriptionId
    where
        F: Fn(&Payload) + Send + Sync + 'static,
    {
        self.inner.subscriptions.add(action, false, listener)
    }

    /// Like [`on`](Self::on), but the listener is dropped after it fires once.
    pub fn once<F>(&self, action: impl Into<String>, listener: F) -> SubscriptionId
    where
        F: Fn(&Payload) + Send + Sync + 'static,
    {
        self.inner.subscriptions.add(action, true, listener)
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn off(&self, id: SubscriptionId) -> bool {
        self.inner.subscriptions.remove(id)
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    /// Dispatch any action.
    ///
    /// `args` must be a JSON object or `null`. Actions without a seed rule
    /// are seeded with `type` plus the arguments as given.
    pub async fn dispatch(&self, action: &str, args: Value) -> Result<Dispatched, EngineError> {
        let args = match args {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            _ => {
                return Err(SeedError::InvalidArguments {
                    action: action.to_string(),
                }
                .into());
            }
        };
        self.run(action, args)
            .instrument(info_span!("dispatch", action))
            .await
    }

    /// Record an event.
    pub async fn track(
        &self,
        event: impl Into<String>,
        properties: Option<Value>,
        options: Option<Value>,
    ) -> Result<Payload, EngineError> {
        let mut args = Map::new();
        args.insert("event".to_string(), Value::String(event.into()));
        insert_some(&mut args, "properties", properties);
        insert_some(&mut args, "options", options);
        self.dispatch(actions::TRACK, Value::Object(args))
            .await
            .map(Dispatched::into_payload)
    }

    /// Record a page view.
    pub async fn page(
        &self,
        data: PageData,
        options: Option<Value>,
    ) -> Result<Payload, EngineError> {
        let mut args = Map::new();
        args.insert("properties".to_string(), serde_json::to_value(data)?);
        insert_some(&mut args, "options", options);
        self.dispatch(actions::PAGE, Value::Object(args))
            .await
            .map(Dispatched::into_payload)
    }

    /// Associate the visitor with a user. The identity is updated from the
    /// final payload once the dispatch completes.
    pub async fn identify(
        &self,
        user_id: impl Into<String>,
        traits: Option<Value>,
        options: Option<Value>,
    ) -> Result<Payload, EngineError> {
        let mut args = Map::new();
        args.insert("userId".to_string(), Value::String(user_id.into()));
        insert_some(&mut args, "traits", traits);
        insert_some(&mut args, "options", options);
        self.dispatch(actions::IDENTIFY, Value::Object(args))
            .await
            .map(Dispatched::into_payload)
    }

    /// Dispatch `initialize`.
    pub async fn initialize(&self) -> Result<Payload, EngineError> {
        self.dispatch(actions::INITIALIZE, Value::Null)
            .await
            .map(Dispatched::into_payload)
    }

    /// Dispatch `reset`, then forget the user and roll a new anonymous id.
    pub async fn reset(&self) -> Result<Payload, EngineError> {
        self.dispatch(actions::RESET, Value::Null)
            .await
            .map(Dispatched::into_payload)
    }

    async fn run(&self, action: &str, args: Map<String, Value>) -> Result<Dispatched, EngineError> {
        let inner = &self.inner;
        let registry = self.registry();
        let user = inner.identity.snapshot();

        let input = SeedInput {
            action,
            args: &args,
            user: &user,
            plugins: &registry.namespaces()[..],
        };
        let seed = inner.seeds.seed(&input, inner.clock.now_millis())?;

        let instance = Arc::new(Instance {
            app: inner.config.app.clone(),
            version: inner.config.version.clone(),
            user,
        });
        let dispatched = Orchestrator::new(&registry, instance, &inner.config)
            .run(action, seed)
            .await?;
        debug!(failures = dispatched.failures.len(), "Dispatch complete");

        match action {
            actions::IDENTIFY => inner.identity.identify(&dispatched.payload),
            actions::RESET => inner.identity.reset(),
            _ => {}
        }
        inner.subscriptions.notify(action, &dispatched.payload);

        Ok(dispatched)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.inner.config)
            .field("plugins", &self.plugins())
            .finish()
    }
}

fn insert_some(args: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        args.insert(key.to_string(), value);
    }
}
