//! # hookflow-core
//!
//! Core types for the hookflow plugin dispatch engine.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! plugin authors who only need to describe hooks, not run them.
//!
//! # Building Blocks
//!
//! - [`Payload`]: the JSON record threaded through every waterfall. Every
//!   transformation is a shallow merge that produces a new record.
//! - [`HookName`]: a hook key classified once into a lifecycle phase hook
//!   (`trackStart`), a delivery hook (`track`) or a targeted enrichment hook
//!   (`track:google-analytics`).
//! - [`Handler`]: the plugin-side unit of work. Any `Fn(HookContext) -> Future`
//!   is a handler; synchronous functions are lifted with [`from_fn`].
//! - [`HandlerOutcome`]: the explicit result of a handler, either
//!   `NoChange` or `Merge(patch)`.
//! - [`Plugin`]: a namespace plus its hook table.
//!
//! # Error Types
//!
//! - [`HookNameError`] - a hook key that cannot be classified
//! - [`HandlerFailure`] - a handler error attributed to a plugin and hook
//! - [`MalformedResult`] - a merge patch that is not an object

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod context;
mod error;
mod handler;
mod hook;
mod outcome;
mod payload;
mod plugin;

// Re-exports
pub use context::{HookContext, Instance, User};
pub use error::{BoxError, FailureKind, HandlerFailure, HookNameError, MalformedResult};
pub use handler::{DynHandler, FromFn, Handler, SharedHandler, from_fn};
pub use hook::{HookKind, HookName, Phase};
pub use outcome::{HandlerOutcome, IntoOutcome};
pub use payload::Payload;
pub use plugin::Plugin;
