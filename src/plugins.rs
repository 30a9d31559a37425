//! Extension points applied during materialization.
//!
//! Plugins are the async-capable deferred hooks; the engine drives them
//! with an explicit single-threaded loop, awaiting each `apply` to
//! completion before the next begins. Sequential execution is a contract,
//! not an accident: side effects such as middleware installation observe a
//! deterministic total order.

use async_trait::async_trait;

use crate::errors::BootstrapResult;
use crate::server::App;

/// An external collaborator invoked once during bootstrap.
///
/// A failing `apply` is logged with the plugin's name, aborts the remaining
/// plugins, and propagates to the top-level bootstrap handler. It is never
/// retried or swallowed.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    async fn apply(&self, app: &mut App) -> BootstrapResult<()>;
}

/// A named, synchronous install hook applied after all plugins, in
/// registration order.
pub trait Interceptor: Send + Sync {
    fn name(&self) -> &str;

    fn install(&self, app: &mut App);
}

/// Interceptor built from a router transform.
pub struct LayerInterceptor<F> {
    name: String,
    install: F,
}

impl<F> LayerInterceptor<F>
where
    F: Fn(&mut App) + Send + Sync,
{
    pub fn new(name: impl Into<String>, install: F) -> Self {
        Self {
            name: name.into(),
            install,
        }
    }
}

impl<F> Interceptor for LayerInterceptor<F>
where
    F: Fn(&mut App) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn install(&self, app: &mut App) {
        (self.install)(app)
    }
}
