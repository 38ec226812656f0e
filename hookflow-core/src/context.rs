//! What a handler sees when it is invoked.

use crate::{hook::HookName, payload::Payload};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// The identity a dispatch was started with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The identified user, if `identify` has been called.
    pub user_id: Option<String>,
    /// The anonymous visitor id.
    pub anonymous_id: Option<String>,
    /// Traits recorded by the last `identify`.
    #[serde(default)]
    pub traits: Map<String, Value>,
}

impl User {
    /// `userId` as a JSON value (`null` when absent).
    pub fn user_id_value(&self) -> Value {
        self.user_id.clone().map_or(Value::Null, Value::String)
    }

    /// `anonymousId` as a JSON value (`null` when absent).
    pub fn anonymous_id_value(&self) -> Value {
        self.anonymous_id.clone().map_or(Value::Null, Value::String)
    }
}

/// Read-only view of the engine instance for introspection by handlers.
#[derive(Debug, Clone, Default)]
pub struct Instance {
    /// Application name from the engine configuration.
    pub app: Option<String>,
    /// Application version from the engine configuration.
    pub version: Option<String>,
    /// Identity snapshot taken when the dispatch began.
    pub user: User,
}

/// The argument every handler receives.
#[derive(Debug, Clone)]
pub struct HookContext {
    /// The payload as it stands at this step.
    pub payload: Payload,
    /// Every registered namespace, in registration order.
    pub plugins: Arc<[String]>,
    /// The engine instance.
    pub instance: Arc<Instance>,
    /// The hook this handler was registered under.
    pub hook: HookName,
    /// The namespace of the plugin that owns this handler.
    pub namespace: Arc<str>,
}

impl HookContext {
    /// The action being dispatched.
    pub fn action(&self) -> &str {
        self.hook.action()
    }
}
