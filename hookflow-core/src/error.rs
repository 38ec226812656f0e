//! Error types for hookflow.
//!
//! - [`HookNameError`] - a hook key that cannot be classified
//! - [`HandlerFailure`] - a failed handler invocation, attributed to the
//!   plugin namespace and hook name that produced it
//! - [`FailureKind`] - why the invocation failed
//! - [`MalformedResult`] - a handler returned something that cannot be merged

use thiserror::Error;

/// A boxed error type for handler errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while classifying a hook name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookNameError {
    /// The hook name was empty.
    #[error("hook name is empty")]
    Empty,

    /// A targeted hook (`<action>:<namespace>`) had no action part.
    #[error("hook `{0}` has no action before `:`")]
    MissingAction(String),

    /// A targeted hook (`<action>:<namespace>`) had no target namespace.
    #[error("hook `{0}` has no target namespace after `:`")]
    MissingTarget(String),
}

/// A handler returned a value that is not a mergeable record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("handler result is not an object (got {found})")]
pub struct MalformedResult {
    /// The JSON kind that was returned instead of an object.
    pub found: &'static str,
}

/// Why a handler invocation failed.
#[derive(Error, Debug)]
pub enum FailureKind {
    /// The handler returned an error or its future resolved to one.
    #[error("handler error: {0}")]
    Error(BoxError),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panic(String),

    /// The handler returned a non-mergeable value.
    #[error(transparent)]
    Malformed(#[from] MalformedResult),
}

/// A failed handler invocation.
///
/// Failures are isolated by default: the waterfall that hit one carries on
/// with the payload as it stood before the failing step.
#[derive(Error, Debug)]
#[error("plugin `{namespace}` failed in `{hook}`: {kind}")]
pub struct HandlerFailure {
    /// Namespace of the plugin that owns the handler.
    pub namespace: String,
    /// The hook name the handler was registered under.
    pub hook: String,
    /// What went wrong.
    #[source]
    pub kind: FailureKind,
}

impl HandlerFailure {
    /// Create a failure attributed to `namespace` and `hook`.
    pub fn new(namespace: impl Into<String>, hook: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            namespace: namespace.into(),
            hook: hook.into(),
            kind,
        }
    }

    /// Whether the handler panicked.
    pub fn is_panic(&self) -> bool {
        matches!(self.kind, FailureKind::Panic(_))
    }

    /// Whether the handler returned a non-mergeable value.
    pub fn is_malformed(&self) -> bool {
        matches!(self.kind, FailureKind::Malformed(_))
    }
}

impl From<BoxError> for FailureKind {
    fn from(err: BoxError) -> Self {
        FailureKind::Error(err)
    }
}
