//! Errors surfaced by the engine.

use hookflow_core::HandlerFailure;
use hookflow_std::{RegistryError, SeedError};
use thiserror::Error;

/// Why an engine operation was rejected.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A plugin could not be registered.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The seed payload could not be built. No handler ran.
    #[error("cannot seed payload: {0}")]
    Seed(#[from] SeedError),

    /// A handler failed under [`FailurePolicy::FailFast`](hookflow_std::FailurePolicy::FailFast).
    #[error(transparent)]
    Handler(#[from] HandlerFailure),

    /// No plugin is registered under the namespace.
    #[error("no plugin registered under `{0}`")]
    UnknownPlugin(String),

    /// Typed arguments could not be converted to JSON.
    #[error("cannot encode arguments: {0}")]
    Arguments(#[from] serde_json::Error),
}

impl EngineError {
    /// The handler failure, if that is what aborted the operation.
    pub fn as_handler_failure(&self) -> Option<&HandlerFailure> {
        match self {
            Self::Handler(failure) => Some(failure),
            _ => None,
        }
    }
}
