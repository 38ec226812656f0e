//! # hookflow-std
//!
//! Standard implementations for the hookflow dispatch engine.
//!
//! This crate provides:
//! - **Registry**: [`RegistryBuilder`] and the frozen [`Registry`] that
//!   indexes classified hooks per action
//! - **Waterfall executor**: [`Waterfall`], the ordered reduction every phase
//!   and enrichment runs on
//! - **Delivery strategies**: [`SequentialDelivery`], [`ConcurrentDelivery`]
//! - **Payload seeding**: [`PayloadBuilder`] and the built-in seed rules
//! - **Handler wrappers**: logging, timeout
//! - **Testing utilities**: recorders and fixed-behavior handlers

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use hookflow_core;

// Modules
pub mod clock;
pub mod delivery;
pub mod hooks;
pub mod registry;
pub mod seed;
pub mod testing;
pub mod waterfall;

pub use clock::Clock;
pub use delivery::{ConcurrentDelivery, DeliveryStrategy, DeliveryTarget, SequentialDelivery};
pub use registry::{
    ActionHooks, EnabledHandle, HookSlot, PluginEntry, Registry, RegistryBuilder, RegistryError,
};
pub use seed::{PageData, PayloadBuilder, SeedError, SeedInput, SeedRule, actions};
pub use waterfall::{FailurePolicy, Waterfall, invoke};
