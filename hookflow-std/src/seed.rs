//! Payload seeding.
//!
//! Every dispatch starts from a seed payload built by the [`SeedRule`]
//! registered for its action. Actions without a rule fall back to `type`
//! plus whatever arguments were supplied, so callers may dispatch actions
//! the engine has never heard of.

use hookflow_core::{Payload, User};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{collections::HashMap, fmt, sync::Arc};
use thiserror::Error;
use tracing::debug;

/// Names of the actions with built-in seed rules.
pub mod actions {
    /// `track(event, properties, options)`.
    pub const TRACK: &str = "track";
    /// `page(data, options)`.
    pub const PAGE: &str = "page";
    /// `identify(userId, traits, options)`.
    pub const IDENTIFY: &str = "identify";
    /// `initialize()`.
    pub const INITIALIZE: &str = "initialize";
    /// `reset()`.
    pub const RESET: &str = "reset";
}

/// A seed payload could not be built. Fatal to the dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeedError {
    /// A required argument was not supplied.
    #[error("`{action}` requires argument `{name}`")]
    MissingArgument {
        /// The action being seeded.
        action: String,
        /// The missing argument.
        name: &'static str,
    },

    /// An argument had the wrong JSON type.
    #[error("`{action}` argument `{name}` must be {expected}")]
    InvalidArgument {
        /// The action being seeded.
        action: String,
        /// The offending argument.
        name: &'static str,
        /// What was expected.
        expected: &'static str,
    },

    /// The argument bundle itself was not an object.
    #[error("`{action}` arguments must be an object")]
    InvalidArguments {
        /// The action being seeded.
        action: String,
    },
}

/// Everything a seed rule may draw on.
#[derive(Debug, Clone, Copy)]
pub struct SeedInput<'a> {
    /// The action being dispatched.
    pub action: &'a str,
    /// Caller-supplied arguments.
    pub args: &'a Map<String, Value>,
    /// Ambient identity at dispatch start.
    pub user: &'a User,
    /// Registered namespaces, in registration order.
    pub plugins: &'a [String],
}

impl SeedInput<'_> {
    fn required_str(&self, name: &'static str) -> Result<String, SeedError> {
        match self.args.get(name) {
            Some(Value::String(s)) => Ok(s.clone()),
            None | Some(Value::Null) => Err(SeedError::MissingArgument {
                action: self.action.to_string(),
                name,
            }),
            Some(_) => Err(self.invalid(name, "a string")),
        }
    }

    fn object_or_empty(&self, name: &'static str) -> Result<Value, SeedError> {
        match self.args.get(name) {
            None | Some(Value::Null) => Ok(Value::Object(Map::new())),
            Some(value @ Value::Object(_)) => Ok(value.clone()),
            Some(_) => Err(self.invalid(name, "an object")),
        }
    }

    fn invalid(&self, name: &'static str, expected: &'static str) -> SeedError {
        SeedError::InvalidArgument {
            action: self.action.to_string(),
            name,
            expected,
        }
    }
}

/// Builds the seed payload for one action.
pub trait SeedRule: Send + Sync + 'static {
    /// Produce the action-specific fields. `type` and `meta.timestamp` are
    /// stamped afterwards by the [`PayloadBuilder`].
    fn seed(&self, input: &SeedInput<'_>) -> Result<Payload, SeedError>;
}

impl<F> SeedRule for F
where
    F: Fn(&SeedInput<'_>) -> Result<Payload, SeedError> + Send + Sync + 'static,
{
    fn seed(&self, input: &SeedInput<'_>) -> Result<Payload, SeedError> {
        (self)(input)
    }
}

/// `track`: `event`, `properties`, `options`, `userId`, `anonymousId`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrackRule;

impl SeedRule for TrackRule {
    fn seed(&self, input: &SeedInput<'_>) -> Result<Payload, SeedError> {
        Ok(Payload::new(input.action)
            .with("event", input.required_str("event")?)
            .with("properties", input.object_or_empty("properties")?)
            .with("options", input.object_or_empty("options")?)
            .with("userId", input.user.user_id_value())
            .with("anonymousId", input.user.anonymous_id_value()))
    }
}

/// `page`: page data under `properties`, plus `options` and identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct PageRule;

impl SeedRule for PageRule {
    fn seed(&self, input: &SeedInput<'_>) -> Result<Payload, SeedError> {
        Ok(Payload::new(input.action)
            .with("properties", input.object_or_empty("properties")?)
            .with("options", input.object_or_empty("options")?)
            .with("userId", input.user.user_id_value())
            .with("anonymousId", input.user.anonymous_id_value()))
    }
}

/// `identify`: `userId` (required), `traits`, `options`, `anonymousId`.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentifyRule;

impl SeedRule for IdentifyRule {
    fn seed(&self, input: &SeedInput<'_>) -> Result<Payload, SeedError> {
        Ok(Payload::new(input.action)
            .with("userId", input.required_str("userId")?)
            .with("traits", input.object_or_empty("traits")?)
            .with("options", input.object_or_empty("options")?)
            .with("anonymousId", input.user.anonymous_id_value()))
    }
}

/// `initialize`: the registered namespaces under `plugins`.
#[derive(Debug, Default, Clone, Copy)]
pub struct InitializeRule;

impl SeedRule for InitializeRule {
    fn seed(&self, input: &SeedInput<'_>) -> Result<Payload, SeedError> {
        Ok(Payload::new(input.action).with("plugins", input.plugins.to_vec()))
    }
}

/// `reset`: the identity about to be cleared.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResetRule;

impl SeedRule for ResetRule {
    fn seed(&self, input: &SeedInput<'_>) -> Result<Payload, SeedError> {
        Ok(Payload::new(input.action)
            .with("userId", input.user.user_id_value())
            .with("anonymousId", input.user.anonymous_id_value()))
    }
}

/// Unrecognized actions: `type` plus the supplied arguments.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackRule;

impl SeedRule for FallbackRule {
    fn seed(&self, input: &SeedInput<'_>) -> Result<Payload, SeedError> {
        Ok(Payload::new(input.action).merge(input.args))
    }
}

/// Page data for `page` dispatches.
///
/// Serialized (camelCase, absent fields omitted) into `properties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    /// Document title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Full URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// URL path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// URL query string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// URL fragment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Referring URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    /// Viewport width in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Viewport height in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl PageData {
    /// Page data for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the referrer.
    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }
}

/// Builds seed payloads from per-action [`SeedRule`]s.
#[derive(Clone, Default)]
pub struct PayloadBuilder {
    rules: HashMap<String, Arc<dyn SeedRule>>,
}

impl PayloadBuilder {
    /// A builder with no rules; every action uses the fallback.
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// A builder with the built-in rules for `track`, `page`, `identify`,
    /// `initialize` and `reset`.
    pub fn standard() -> Self {
        Self::new()
            .rule(actions::TRACK, TrackRule)
            .rule(actions::PAGE, PageRule)
            .rule(actions::IDENTIFY, IdentifyRule)
            .rule(actions::INITIALIZE, InitializeRule)
            .rule(actions::RESET, ResetRule)
    }

    /// Register (or replace) the rule for `action`.
    pub fn rule(mut self, action: impl Into<String>, rule: impl SeedRule) -> Self {
        self.rules.insert(action.into(), Arc::new(rule));
        self
    }

    /// Whether `action` has a dedicated rule.
    pub fn has_rule(&self, action: &str) -> bool {
        self.rules.contains_key(action)
    }

    /// Build the seed payload and stamp `type` and `meta.timestamp` on it.
    pub fn seed(&self, input: &SeedInput<'_>, timestamp: i64) -> Result<Payload, SeedError> {
        let payload = match self.rules.get(input.action) {
            Some(rule) => rule.seed(input)?,
            None => {
                debug!(action = input.action, "No seed rule; using fallback");
                FallbackRule.seed(input)?
            }
        };
        Ok(stamp(payload, input.action, timestamp))
    }
}

fn stamp(payload: Payload, action: &str, timestamp: i64) -> Payload {
    let mut meta = match payload.get("meta") {
        Some(Value::Object(meta)) => meta.clone(),
        _ => Map::new(),
    };
    meta.insert("timestamp".to_string(), Value::from(timestamp));
    payload
        .with("type", action)
        .with("meta", Value::Object(meta))
}

impl fmt::Debug for PayloadBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut actions: Vec<_> = self.rules.keys().collect();
        actions.sort();
        f.debug_struct("PayloadBuilder")
            .field("rules", &actions)
            .finish()
    }
}
