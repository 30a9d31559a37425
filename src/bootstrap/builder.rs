//! Fluent application builder.
//!
//! Every chained call mutates exactly one field of the builder state (or
//! appends to exactly one ordered sequence) and returns the builder, so
//! calls chain arbitrarily. The state is write-only until the terminal
//! `listen` call, which consumes the builder; ownership makes the frozen
//! phase a compile-time fact.

use std::path::PathBuf;
use std::sync::Arc;

use crate::controller::Controller;
use crate::discovery::ComponentSource;
use crate::health::{health_module, HealthOptions};
use crate::metrics::{metrics_module, MetricsOptions};
use crate::middleware::{RateLimitPlugin, RequestLoggingPlugin, SecurityHeadersOptions};
use crate::modules::{InstallSetup, ModuleDescriptor, ProviderSetup};
use crate::openapi::SwaggerOptions;
use crate::plugins::{Interceptor, Plugin};
use crate::server::{App, CorsOptions, NetworkAdapter, TcpAdapter, VersioningOptions};
use crate::starters::{
    cache_module, config_module, database_module, document_store_module, CacheOptions,
    DatabaseOptions, DocumentStoreOptions,
};

/// Named-token provider bindings for cross-cutting framework pieces.
pub const APP_PIPE: &str = "APP_PIPE";
pub const APP_FILTER: &str = "APP_FILTER";
pub const APP_GUARD: &str = "APP_GUARD";

/// Accumulated configuration intent, frozen at materialization.
pub(crate) struct BuilderState {
    pub port: Option<u16>,
    pub global_prefix: Option<String>,
    pub cors: Option<CorsOptions>,
    pub versioning: Option<VersioningOptions>,
    pub swagger: Option<SwaggerOptions>,
    pub setup_actions: Vec<InstallSetup>,
    pub plugins: Vec<Box<dyn Plugin>>,
    pub feature_modules: Vec<ModuleDescriptor>,
    pub discovery_path: Option<PathBuf>,
    pub component_source: Option<Box<dyn ComponentSource + Send>>,
    pub global_providers: Vec<ProviderSetup>,
    pub interceptors: Vec<Box<dyn Interceptor>>,
    pub extra_controllers: Vec<Arc<dyn Controller>>,
}

impl Default for BuilderState {
    fn default() -> Self {
        Self {
            port: None,
            global_prefix: None,
            cors: None,
            versioning: None,
            swagger: None,
            setup_actions: Vec::new(),
            plugins: Vec::new(),
            feature_modules: Vec::new(),
            discovery_path: None,
            component_source: None,
            global_providers: Vec::new(),
            interceptors: Vec::new(),
            extra_controllers: Vec::new(),
        }
    }
}

/// The application bootstrapper.
///
/// Constructed through [`crate::bootstrap::launch`] (or directly for
/// tests), configured through chained calls, consumed by
/// [`AppBootstrapper::listen`].
pub struct AppBootstrapper {
    pub(crate) root: ModuleDescriptor,
    pub(crate) adapter: Box<dyn NetworkAdapter>,
    pub(crate) state: BuilderState,
}

impl AppBootstrapper {
    /// Create a bootstrapper for the given root module with the default
    /// TCP network adapter.
    pub fn new(root: ModuleDescriptor) -> Self {
        Self::with_adapter(root, Box::new(TcpAdapter))
    }

    /// Create a bootstrapper with a custom network adapter.
    pub fn with_adapter(root: ModuleDescriptor, adapter: Box<dyn NetworkAdapter>) -> Self {
        Self {
            root,
            adapter,
            state: BuilderState::default(),
        }
    }

    // --- scalar fields: last write wins ---

    pub fn with_port(mut self, port: u16) -> Self {
        self.state.port = Some(port);
        self
    }

    /// Set the global route prefix. Normalized to start with `/`.
    pub fn with_global_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.state.global_prefix = Some(if prefix.starts_with('/') {
            prefix
        } else {
            format!("/{}", prefix)
        });
        self
    }

    pub fn with_cors(mut self, options: CorsOptions) -> Self {
        self.state.cors = Some(options);
        self
    }

    pub fn with_versioning(mut self, options: VersioningOptions) -> Self {
        self.state.versioning = Some(options);
        self
    }

    pub fn with_swagger(mut self, options: SwaggerOptions) -> Self {
        self.state.swagger = Some(options);
        self
    }

    // --- ordered sequences: append-only ---

    /// Register a deferred setup action, executed in registration order
    /// after the app is instantiated.
    pub fn with_setup(mut self, action: impl FnOnce(&mut App) + Send + 'static) -> Self {
        self.state.setup_actions.push(Box::new(action));
        self
    }

    /// Register a plugin, applied in registration order, each awaited
    /// before the next begins.
    pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.state.plugins.push(Box::new(plugin));
        self
    }

    /// Append a feature module to the composition-root imports.
    pub fn with_module(mut self, module: ModuleDescriptor) -> Self {
        self.state.feature_modules.push(module);
        self
    }

    pub fn with_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.state.interceptors.push(Box::new(interceptor));
        self
    }

    pub fn with_controller(mut self, controller: Arc<dyn Controller>) -> Self {
        self.state.extra_controllers.push(controller);
        self
    }

    /// Bind a value under a named provider token.
    pub fn with_global_provider<T: Send + Sync + 'static>(
        mut self,
        token: impl Into<String>,
        value: T,
    ) -> Self {
        let token = token.into();
        self.state.global_providers.push(Box::new(move |services| {
            services.insert_named(token, value);
            Ok(())
        }));
        self
    }

    pub fn with_validation_pipe<T: Send + Sync + 'static>(self, pipe: T) -> Self {
        self.with_global_provider(APP_PIPE, pipe)
    }

    pub fn with_exception_filter<T: Send + Sync + 'static>(self, filter: T) -> Self {
        self.with_global_provider(APP_FILTER, filter)
    }

    pub fn with_global_guard<T: Send + Sync + 'static>(self, guard: T) -> Self {
        self.with_global_provider(APP_GUARD, guard)
    }

    // --- starters ---

    pub fn with_database(self, options: DatabaseOptions) -> Self {
        self.with_module(database_module(options))
    }

    pub fn with_cache(self, options: CacheOptions) -> Self {
        self.with_module(cache_module(options))
    }

    pub fn with_document_store(self, options: DocumentStoreOptions) -> Self {
        self.with_module(document_store_module(options))
    }

    pub fn with_config<T: crate::config::FromEnvConfig>(self) -> Self {
        self.with_module(config_module::<T>())
    }

    pub fn with_health(self, options: HealthOptions) -> Self {
        self.with_module(health_module(options))
    }

    pub fn with_metrics(self, options: MetricsOptions) -> Self {
        self.with_module(metrics_module(options))
    }

    // --- discovery ---

    /// Scan a source tree for self-registered components during
    /// materialization. At most one scan runs per bootstrap.
    pub fn with_auto_discovery(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.state.discovery_path = Some(base_path.into());
        self
    }

    /// Replace the component source the scan loads from. Exists so
    /// discovery is testable without the global registry.
    pub fn with_component_source(
        mut self,
        source: impl ComponentSource + Send + 'static,
    ) -> Self {
        self.state.component_source = Some(Box::new(source));
        self
    }

    // --- combinators ---

    /// Apply `configure` only when `predicate` holds. Re-entrant: nested
    /// `when` calls are legal.
    pub fn when(self, predicate: bool, configure: impl FnOnce(Self) -> Self) -> Self {
        if predicate {
            configure(self)
        } else {
            self
        }
    }

    /// Development preset: API docs plus request logging. Identical to
    /// calling `with_swagger(SwaggerOptions::default())` and
    /// `with_plugin(RequestLoggingPlugin)`.
    pub fn with_development_defaults(self) -> Self {
        self.with_swagger(SwaggerOptions::default())
            .with_plugin(RequestLoggingPlugin)
    }

    /// Production preset: security headers, response compression,
    /// graceful shutdown, and rate limiting, via the same primitives.
    pub fn with_production_defaults(self) -> Self {
        self.with_setup(|app| {
            let headers = SecurityHeadersOptions::strict();
            app.map_router(|router| headers.apply(router));
        })
        .with_setup(|app| {
            app.map_router(|router| {
                router.layer(tower_http::compression::CompressionLayer::new())
            });
        })
        .with_setup(|app| app.enable_graceful_shutdown())
        .with_plugin(RateLimitPlugin::default())
    }

    // --- introspection (debugging and tests) ---

    pub fn configured_port(&self) -> Option<u16> {
        self.state.port
    }

    pub fn global_prefix(&self) -> Option<&str> {
        self.state.global_prefix.as_deref()
    }

    pub fn swagger_options(&self) -> Option<&SwaggerOptions> {
        self.state.swagger.as_ref()
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.state.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn feature_module_names(&self) -> Vec<&str> {
        self.state.feature_modules.iter().map(|m| m.name()).collect()
    }

    pub fn setup_action_count(&self) -> usize {
        self.state.setup_actions.len()
    }
}

impl std::fmt::Debug for AppBootstrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppBootstrapper")
            .field("root", &self.root.name())
            .field("port", &self.state.port)
            .field("feature_modules", &self.feature_module_names())
            .field("plugins", &self.plugin_names())
            .finish()
    }
}
