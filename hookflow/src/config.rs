//! Engine configuration.

use hookflow_std::FailurePolicy;

/// How the delivery phase schedules plugins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeliveryMode {
    /// One plugin at a time, in registration order.
    #[default]
    Sequential,
    /// Every plugin at once. The dispatch still waits for all of them.
    Concurrent,
}

/// Static settings for an [`Engine`](crate::Engine).
///
/// Usually populated through [`EngineBuilder`](crate::EngineBuilder), but can
/// be built directly and handed over with
/// [`EngineBuilder::config`](crate::EngineBuilder::config).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Application name exposed to handlers through the instance view.
    pub app: Option<String>,
    /// Application version exposed to handlers through the instance view.
    pub version: Option<String>,
    /// What a handler failure does to the rest of its dispatch.
    pub failure_policy: FailurePolicy,
    /// Scheduling of the delivery phase.
    pub delivery_mode: DeliveryMode,
}

impl EngineConfig {
    /// Create a configuration with defaults: failures isolated, delivery
    /// sequential.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application name.
    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Set the application version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Set the delivery mode.
    pub fn with_delivery_mode(mut self, mode: DeliveryMode) -> Self {
        self.delivery_mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::new();
        assert_eq!(config.failure_policy, FailurePolicy::Isolate);
        assert_eq!(config.delivery_mode, DeliveryMode::Sequential);
        assert!(config.app.is_none());
    }

    #[test]
    fn test_setters() {
        let config = EngineConfig::new()
            .with_app("shop")
            .with_version("1.2.0")
            .with_failure_policy(FailurePolicy::FailFast)
            .with_delivery_mode(DeliveryMode::Concurrent);
        assert_eq!(config.app.as_deref(), Some("shop"));
        assert_eq!(config.version.as_deref(), Some("1.2.0"));
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.delivery_mode, DeliveryMode::Concurrent);
    }
}
