//! Handler outcome conversion.

use crate::{
    error::{BoxError, MalformedResult},
    payload::Payload,
};
use serde_json::{Map, Value};

/// The result of one handler invocation.
///
/// `NoChange` and `Merge` of an empty object are equivalent: both leave the
/// carried payload exactly as it was.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum HandlerOutcome {
    /// Leave the payload untouched.
    #[default]
    NoChange,
    /// Shallow-merge this value over the payload. Must be an object.
    Merge(Value),
}

impl HandlerOutcome {
    /// Build a `Merge` outcome.
    pub fn merge(patch: impl Into<Value>) -> Self {
        HandlerOutcome::Merge(patch.into())
    }

    /// Whether this outcome leaves the payload untouched.
    pub fn is_no_change(&self) -> bool {
        match self {
            HandlerOutcome::NoChange | HandlerOutcome::Merge(Value::Null) => true,
            HandlerOutcome::Merge(Value::Object(map)) => map.is_empty(),
            HandlerOutcome::Merge(_) => false,
        }
    }

    /// Apply this outcome to `payload`, producing the next payload.
    ///
    /// `null` is read as "no change". Any other non-object is malformed.
    pub fn apply(&self, payload: &Payload) -> Result<Payload, MalformedResult> {
        match self {
            HandlerOutcome::NoChange | HandlerOutcome::Merge(Value::Null) => Ok(payload.clone()),
            HandlerOutcome::Merge(Value::Object(patch)) => Ok(payload.merge(patch)),
            HandlerOutcome::Merge(other) => Err(MalformedResult {
                found: json_kind(other),
            }),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Trait for converting a handler's return value into a [`HandlerOutcome`].
///
/// # Default Implementations
///
/// - `()` → `NoChange`
/// - `HandlerOutcome` → As is
/// - `Value` / `Map` / `Payload` → `Merge`
/// - `Option<T>` → `None` is `NoChange`, `Some` delegates
/// - `Result<T, E>` → Delegates to inner `T` or propagates error
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be returned from a handler",
    label = "missing `IntoOutcome` implementation",
    note = "Handlers return `()`, `HandlerOutcome`, a JSON object, or an `Option`/`Result` of those."
)]
pub trait IntoOutcome {
    /// Convert into an outcome, or the handler's error.
    fn into_outcome(self) -> Result<HandlerOutcome, BoxError>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<HandlerOutcome, BoxError> {
        Ok(HandlerOutcome::NoChange)
    }
}

impl IntoOutcome for HandlerOutcome {
    fn into_outcome(self) -> Result<HandlerOutcome, BoxError> {
        Ok(self)
    }
}

impl IntoOutcome for Value {
    fn into_outcome(self) -> Result<HandlerOutcome, BoxError> {
        Ok(HandlerOutcome::Merge(self))
    }
}

impl IntoOutcome for Map<String, Value> {
    fn into_outcome(self) -> Result<HandlerOutcome, BoxError> {
        Ok(HandlerOutcome::Merge(Value::Object(self)))
    }
}

impl IntoOutcome for Payload {
    fn into_outcome(self) -> Result<HandlerOutcome, BoxError> {
        Ok(HandlerOutcome::Merge(self.into_value()))
    }
}

impl<T: IntoOutcome> IntoOutcome for Option<T> {
    fn into_outcome(self) -> Result<HandlerOutcome, BoxError> {
        match self {
            Some(t) => t.into_outcome(),
            None => Ok(HandlerOutcome::NoChange),
        }
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Result<HandlerOutcome, BoxError> {
        match self {
            Ok(t) => t.into_outcome(),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_change_preserves_payload() {
        let payload = Payload::new("track").with("event", "x");
        assert_eq!(HandlerOutcome::NoChange.apply(&payload).unwrap(), payload);
        assert_eq!(
            HandlerOutcome::merge(json!({})).apply(&payload).unwrap(),
            payload
        );
        assert_eq!(HandlerOutcome::Merge(Value::Null).apply(&payload).unwrap(), payload);
    }

    #[test]
    fn test_malformed_results() {
        let payload = Payload::new("track");
        let err = HandlerOutcome::merge(42).apply(&payload).unwrap_err();
        assert_eq!(err.found, "a number");
        assert!(HandlerOutcome::merge("nope").apply(&payload).is_err());
        assert!(!HandlerOutcome::merge(json!([1])).is_no_change());
    }

    #[test]
    fn test_conversions() {
        assert_eq!(().into_outcome().unwrap(), HandlerOutcome::NoChange);
        assert_eq!(
            None::<Value>.into_outcome().unwrap(),
            HandlerOutcome::NoChange
        );
        assert_eq!(
            Some(json!({"a": 1})).into_outcome().unwrap(),
            HandlerOutcome::merge(json!({"a": 1}))
        );

        let failed: Result<(), &str> = Err("boom");
        assert_eq!(failed.into_outcome().unwrap_err().to_string(), "boom");
    }
}
