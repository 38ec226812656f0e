//! The record threaded through every waterfall.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key holding the action (or phase hook) name.
pub const TYPE_KEY: &str = "type";
/// Key holding dispatch metadata.
pub const META_KEY: &str = "meta";
/// Key inside `meta` holding the seed timestamp.
pub const TIMESTAMP_KEY: &str = "timestamp";

/// One in-flight event.
///
/// A payload is never mutated once a waterfall step has produced it: every
/// transformation ([`merge`](Payload::merge), [`with_type`](Payload::with_type))
/// returns a new record. Merges are shallow, so a nested value in a patch
/// replaces the whole nested value in the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Create a payload carrying only `type`.
    pub fn new(action: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(TYPE_KEY.to_string(), Value::String(action.into()));
        Self(map)
    }

    /// Wrap an existing map.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Set a top-level field, consuming the payload.
    ///
    /// Used while a payload is being seeded, before it enters a waterfall.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// The `type` field.
    pub fn action(&self) -> Option<&str> {
        self.get_str(TYPE_KEY)
    }

    /// Get a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a top-level string field.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Whether a top-level field is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// `meta.timestamp`, if present.
    pub fn timestamp(&self) -> Option<i64> {
        self.0
            .get(META_KEY)
            .and_then(|meta| meta.get(TIMESTAMP_KEY))
            .and_then(Value::as_i64)
    }

    /// Shallow-merge `patch` over this payload into a new record.
    pub fn merge(&self, patch: &Map<String, Value>) -> Payload {
        let mut next = self.0.clone();
        for (key, value) in patch {
            next.insert(key.clone(), value.clone());
        }
        Payload(next)
    }

    /// A copy of this payload with `type` replaced.
    pub fn with_type(&self, action: &str) -> Payload {
        let mut next = self.0.clone();
        next.insert(TYPE_KEY.to_string(), Value::String(action.to_string()));
        Payload(next)
    }

    /// A copy of this payload without `meta`.
    ///
    /// Handy for comparing payloads produced by different dispatches.
    pub fn without_meta(&self) -> Payload {
        let mut next = self.0.clone();
        next.remove(META_KEY);
        Payload(next)
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload has no fields at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Unwrap into the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Convert into a JSON object value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Payload> for Value {
    fn from(payload: Payload) -> Self {
        payload.into_value()
    }
}
