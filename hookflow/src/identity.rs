//! Ambient user identity.

use hookflow_core::{Payload, User};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// The identity seeded into `track`, `page` and `identify` payloads.
///
/// Starts anonymous with a fresh v4 anonymous id. A completed `identify`
/// dispatch records the final payload's `userId` and `traits`; a completed
/// `reset` clears both and rolls a new anonymous id.
#[derive(Debug)]
pub(crate) struct Identity {
    user: RwLock<User>,
}

impl Identity {
    pub(crate) fn new() -> Self {
        Self {
            user: RwLock::new(anonymous()),
        }
    }

    pub(crate) fn snapshot(&self) -> User {
        self.user.read().clone()
    }

    pub(crate) fn identify(&self, payload: &Payload) {
        let mut user = self.user.write();
        if let Some(user_id) = payload.get_str("userId") {
            user.user_id = Some(user_id.to_string());
        }
        if let Some(Value::Object(traits)) = payload.get("traits") {
            user.traits = traits.clone();
        }
        debug!(user_id = ?user.user_id, "Identity updated");
    }

    pub(crate) fn reset(&self) {
        *self.user.write() = anonymous();
        debug!("Identity reset");
    }
}

fn anonymous() -> User {
    User {
        anonymous_id: Some(Uuid::new_v4().to_string()),
        ..User::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_starts_anonymous() {
        let identity = Identity::new();
        let user = identity.snapshot();
        assert!(user.user_id.is_none());
        assert!(user.anonymous_id.is_some());
        assert!(user.traits.is_empty());
    }

    #[test]
    fn test_identify_takes_final_payload_values() {
        let identity = Identity::new();
        let payload = Payload::new("identify")
            .with("userId", "u-1")
            .with("traits", json!({"plan": "pro"}));
        identity.identify(&payload);

        let user = identity.snapshot();
        assert_eq!(user.user_id.as_deref(), Some("u-1"));
        assert_eq!(user.traits.get("plan"), Some(&json!("pro")));
    }

    #[test]
    fn test_reset_rolls_anonymous_id() {
        let identity = Identity::new();
        let before = identity.snapshot().anonymous_id;
        identity.identify(&Payload::new("identify").with("userId", "u-1"));
        identity.reset();

        let user = identity.snapshot();
        assert!(user.user_id.is_none());
        assert_ne!(user.anonymous_id, before);
    }
}
