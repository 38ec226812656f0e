//! # hookflow - Plugin dispatch for analytics events
//!
//! `hookflow` routes analytics actions (`track`, `page`, `identify`, ...)
//! through an ordered pipeline of plugins. Each plugin declares hooks by
//! name; every dispatch runs three phases:
//!
//! 1. **Start**: `<action>Start` hooks reduce the payload in registration
//!    order.
//! 2. **Delivery**: each plugin with an `<action>` hook receives its own
//!    copy of the ready payload, enriched by any `<action>:<namespace>`
//!    hooks aimed at it.
//! 3. **Complete**: `<action>Complete` hooks reduce the ready payload.
//!
//! A failing or panicking handler is isolated by default: its step is
//! skipped, the failure is logged and reported, and the dispatch goes on.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hookflow::prelude::*;
//! use serde_json::json;
//!
//! let engine = Engine::builder()
//!     .plugin(Plugin::new("stamp").hook_fn("trackStart", |_ctx: HookContext| {
//!         json!({"source": "web"})
//!     }))
//!     .plugin(Plugin::new("console").hook_fn("track", |ctx: HookContext| {
//!         println!("{:?}", ctx.payload);
//!     }))
//!     .build();
//!
//! let payload = engine.track("signup", Some(json!({"plan": "pro"})), None).await?;
//! assert_eq!(payload.get_str("source"), Some("web"));
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod identity;
mod orchestrator;
mod subscriptions;

pub use config::{DeliveryMode, EngineConfig};
pub use engine::{Engine, EngineBuilder};
pub use error::EngineError;
pub use orchestrator::Dispatched;
pub use subscriptions::{SubscriptionId, WILDCARD};

pub use hookflow_core::{
    BoxError, FailureKind, FromFn, Handler, HandlerFailure, HandlerOutcome, HookContext, HookKind,
    HookName, HookNameError, Instance, IntoOutcome, MalformedResult, Payload, Phase, Plugin,
    SharedHandler, User, from_fn,
};
pub use hookflow_std::{
    FailurePolicy, PageData, PayloadBuilder, RegistryError, SeedError, SeedInput, SeedRule,
    actions,
};

/// Plugin registry types.
pub mod registry {
    pub use hookflow_std::registry::{
        ActionHooks, EnabledHandle, HookSlot, PluginEntry, Registry, RegistryBuilder,
    };
}

/// Handler wrappers.
pub mod hooks {
    #![allow(clippy::wildcard_imports)]
    pub use hookflow_std::hooks::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use hookflow_std::testing::*;
}

/// Prelude module - common imports for hookflow.
///
/// # Usage
///
/// ```rust,ignore
/// use hookflow::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BoxError, DeliveryMode, Engine, EngineError, FailurePolicy, Handler, HandlerOutcome,
        HookContext, IntoOutcome, PageData, Payload, Plugin, from_fn,
    };
}
