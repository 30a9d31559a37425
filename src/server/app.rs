//! The application handle passed to setup actions, plugins, and
//! interceptors.
//!
//! Wraps the axum router and the frozen service map. Cross-cutting setup
//! mutates the router through [`App::map_router`]; services are read-only
//! by the time an `App` exists.

use std::sync::Arc;

use axum::routing::MethodRouter;
use axum::Router;

use crate::services::ServiceMap;

pub struct App {
    router: Router,
    services: Arc<ServiceMap>,
    graceful_shutdown: bool,
}

impl App {
    pub(crate) fn new(router: Router, services: Arc<ServiceMap>) -> Self {
        Self {
            router,
            services,
            graceful_shutdown: false,
        }
    }

    /// The frozen service map.
    pub fn services(&self) -> &Arc<ServiceMap> {
        &self.services
    }

    /// Transform the router in place. This is how layers and late routes
    /// are installed without re-stating axum's layer bounds everywhere.
    pub fn map_router(&mut self, f: impl FnOnce(Router) -> Router) {
        let router = std::mem::take(&mut self.router);
        self.router = f(router);
    }

    /// Add a single route. The path is normalized to start with `/`;
    /// axum panics on one that does not.
    pub fn route(&mut self, path: &str, handler: MethodRouter) {
        let path = normalize_route_path(path);
        self.map_router(|router| router.route(&path, handler));
    }

    /// Opt in to signal-driven graceful shutdown when serving.
    pub fn enable_graceful_shutdown(&mut self) {
        self.graceful_shutdown = true;
    }

    pub fn graceful_shutdown(&self) -> bool {
        self.graceful_shutdown
    }

    /// Consume the handle, yielding the finished router.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Prefix a missing leading `/` so option-supplied paths cannot panic the
/// router at install time.
pub(crate) fn normalize_route_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("graceful_shutdown", &self.graceful_shutdown)
            .field("services", &self.services)
            .finish()
    }
}
