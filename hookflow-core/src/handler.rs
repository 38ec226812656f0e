//! # Handlers
//!
//! A handler is the unit of plugin code the engine invokes. It receives an
//! owned [`HookContext`] and resolves to a [`HandlerOutcome`].
//!
//! # Usage Patterns
//!
//! 1. **Async closure**: `|ctx: HookContext| async move { ... }`
//! 2. **Sync closure**: `from_fn(|ctx: HookContext| json!({ ... }))`
//! 3. **Struct implementation**: `impl Handler for MyHandler`
//!
//! Closures may return anything implementing [`IntoOutcome`]: `()`, a JSON
//! object, an `Option` of one, or a `Result`.

use crate::{
    context::HookContext,
    error::BoxError,
    outcome::{HandlerOutcome, IntoOutcome},
};
use futures::future::BoxFuture;
use std::{
    fmt,
    future::{Future, ready},
    sync::Arc,
};

/// Plugin code attached to a hook.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a hook `Handler`",
    label = "missing `Handler` implementation",
    note = "Use an async closure taking `HookContext`, or wrap a sync closure with `from_fn`."
)]
pub trait Handler: Send + Sync + 'static {
    /// Invoke the handler.
    fn handle(
        &self,
        ctx: HookContext,
    ) -> impl Future<Output = Result<HandlerOutcome, BoxError>> + Send;
}

/// Dynamic object-safe version of [`Handler`].
///
/// Use this trait when you need runtime polymorphism (e.g., in a Registry).
pub trait DynHandler: Send + Sync + 'static {
    /// Invoke the handler (dynamic dispatch version).
    fn handle_dyn(&self, ctx: HookContext) -> BoxFuture<'_, Result<HandlerOutcome, BoxError>>;
}

// Blanket implementation: Any type implementing Handler implements DynHandler automatically.
impl<T: Handler> DynHandler for T {
    fn handle_dyn(&self, ctx: HookContext) -> BoxFuture<'_, Result<HandlerOutcome, BoxError>> {
        Box::pin(self.handle(ctx))
    }
}

// Blanket impl for async closures
impl<F, Fut, Out> Handler for F
where
    F: Fn(HookContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Out> + Send,
    Out: IntoOutcome,
{
    fn handle(
        &self,
        ctx: HookContext,
    ) -> impl Future<Output = Result<HandlerOutcome, BoxError>> + Send {
        let fut = (self)(ctx);
        async move { fut.await.into_outcome() }
    }
}

/// A handler built from a synchronous function. See [`from_fn`].
#[derive(Clone)]
pub struct FromFn<F>(F);

/// Lift a synchronous function into a [`Handler`].
///
/// ```rust,ignore
/// let enrich = from_fn(|_ctx| json!({ "foo": "baz" }));
/// ```
pub fn from_fn<F, Out>(f: F) -> FromFn<F>
where
    F: Fn(HookContext) -> Out + Send + Sync + 'static,
    Out: IntoOutcome,
{
    FromFn(f)
}

impl<F, Out> Handler for FromFn<F>
where
    F: Fn(HookContext) -> Out + Send + Sync + 'static,
    Out: IntoOutcome,
{
    fn handle(
        &self,
        ctx: HookContext,
    ) -> impl Future<Output = Result<HandlerOutcome, BoxError>> + Send {
        ready((self.0)(ctx).into_outcome())
    }
}

/// A cheaply clonable, type-erased handler.
#[derive(Clone)]
pub struct SharedHandler(Arc<dyn DynHandler>);

impl SharedHandler {
    /// Erase a handler.
    pub fn new<H: Handler>(handler: H) -> Self {
        Self(Arc::new(handler))
    }

    /// Invoke the wrapped handler.
    pub fn call(&self, ctx: HookContext) -> BoxFuture<'_, Result<HandlerOutcome, BoxError>> {
        self.0.handle_dyn(ctx)
    }
}

impl Handler for SharedHandler {
    fn handle(
        &self,
        ctx: HookContext,
    ) -> impl Future<Output = Result<HandlerOutcome, BoxError>> + Send {
        self.0.handle_dyn(ctx)
    }
}

impl fmt::Debug for SharedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedHandler(..)")
    }
}
