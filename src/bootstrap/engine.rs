//! Materialization engine.
//!
//! Consumes the frozen builder state and turns it into a running
//! application in a fixed sequence: composition-root synthesis, router
//! construction, global prefix, CORS, versioning, deferred setup actions,
//! plugins, interceptors, documentation, port resolution, bind, serve.
//! Any failure along the way aborts materialization with a
//! [`BootstrapError`] describing the failed phase.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use tracing::{debug, error, info};

use super::builder::AppBootstrapper;
use crate::config::resolve_port;
use crate::controller::Controller;
use crate::discovery::{scan_with, RegistrySource};
use crate::errors::{BootstrapError, BootstrapResult};
use crate::modules::{CompositionRoot, ProviderSetup};
use crate::openapi::install_docs;
use crate::server::{resolve_base_url, App, NetworkAdapter};

/// A fully materialized application, not yet bound to the network.
///
/// Produced by [`AppBootstrapper::materialize`]; tests inspect it, the
/// entry point serves it through [`AppBootstrapper::listen`].
pub struct MaterializedApp {
    app: App,
    port: u16,
    docs_path: Option<String>,
    import_names: Vec<String>,
}

impl MaterializedApp {
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Path the API documentation is served at, when configured.
    pub fn docs_path(&self) -> Option<&str> {
        self.docs_path.as_deref()
    }

    /// Module import order the composition root was synthesized with.
    pub fn import_names(&self) -> &[String] {
        &self.import_names
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn into_app(self) -> App {
        self.app
    }
}

impl std::fmt::Debug for MaterializedApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterializedApp")
            .field("port", &self.port)
            .field("docs_path", &self.docs_path)
            .field("import_names", &self.import_names)
            .finish()
    }
}

impl AppBootstrapper {
    /// Materialize the application: synthesize the composition root and
    /// apply every configured concern, in order. Consumes the builder.
    pub async fn materialize(self) -> BootstrapResult<MaterializedApp> {
        let (adapter, materialized) = self.materialize_inner().await?;
        drop(adapter);
        Ok(materialized)
    }

    /// Materialize, bind, and serve. Consumes the builder and runs until
    /// the server stops.
    pub async fn listen(self) -> BootstrapResult<()> {
        let (adapter, materialized) = self.materialize_inner().await?;
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), materialized.port);
        let bound = adapter.bind(addr).await?;

        let base_url = resolve_base_url(bound.local_addr());
        info!(url = %base_url, "application started");
        if let Some(path) = materialized.docs_path() {
            info!(url = format!("{}{}", base_url, path), "api docs available");
        }

        let graceful = materialized.app.graceful_shutdown();
        bound.serve(materialized.into_app().into_router(), graceful).await
    }

    async fn materialize_inner(
        self,
    ) -> BootstrapResult<(Box<dyn NetworkAdapter>, MaterializedApp)> {
        let Self {
            root,
            adapter,
            mut state,
        } = self;

        // Import order: root first, then feature modules as registered.
        let mut imports = vec![root];
        imports.append(&mut state.feature_modules);

        // Discovery contributes providers and controllers to the root.
        let mut providers: Vec<ProviderSetup> = Vec::new();
        let mut controllers: Vec<Arc<dyn Controller>> = Vec::new();
        if let Some(base_path) = state.discovery_path {
            let discovered = match &state.component_source {
                Some(source) => scan_with(source.as_ref(), &base_path),
                None => scan_with(&RegistrySource, &base_path),
            };
            debug!(
                path = %base_path.display(),
                handlers = discovered.handlers.len(),
                injectables = discovered.injectables.len(),
                "auto-discovery complete"
            );
            for record in discovered.injectables {
                if let Some(register) = record.register_service {
                    providers.push(Box::new(move |services| {
                        register(services);
                        Ok(())
                    }));
                }
            }
            for record in discovered.handlers {
                if let Some(build) = record.build_handler {
                    controllers.push(build());
                } else {
                    return Err(BootstrapError::DiscoveryFailed {
                        message: format!(
                            "discovered handler {} has no factory",
                            record.type_name
                        ),
                    });
                }
            }
        }
        providers.append(&mut state.global_providers);
        controllers.append(&mut state.extra_controllers);

        let composition = CompositionRoot::new(imports, providers, controllers);
        let import_names: Vec<String> =
            composition.import_names().iter().map(|s| s.to_string()).collect();
        let mut app = composition.instantiate()?;

        if let Some(prefix) = state.global_prefix {
            if prefix != "/" {
                app.map_router(|router| Router::new().nest(&prefix, router));
            }
        }

        if let Some(cors) = state.cors {
            let layer = cors.into_layer()?;
            app.map_router(|router| router.layer(layer));
        }

        if let Some(versioning) = state.versioning {
            app.map_router(|router| versioning.apply(router));
        }

        for action in state.setup_actions {
            action(&mut app);
        }

        // Plugins run strictly one after another; a failure aborts the
        // remaining plugins and the whole bootstrap.
        for plugin in state.plugins {
            let name = plugin.name().to_string();
            debug!(plugin = %name, "applying plugin");
            plugin.apply(&mut app).await.map_err(|e| {
                error!(plugin = %name, "plugin failed during apply: {}", e);
                BootstrapError::PluginFailed {
                    plugin: name,
                    message: e.to_string(),
                }
            })?;
        }

        for interceptor in state.interceptors {
            debug!(interceptor = interceptor.name(), "installing interceptor");
            interceptor.install(&mut app);
        }

        let docs_path = match state.swagger {
            Some(options) => Some(install_docs(&mut app, &options)),
            None => None,
        };

        // Last: the observation layer must wrap every mounted route,
        // including docs and anything setup actions added.
        crate::metrics::install_observation(&mut app);

        let port = resolve_port(state.port)?;

        Ok((
            adapter,
            MaterializedApp {
                app,
                port,
                docs_path,
                import_names,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::ModuleDescriptor;
    use serial_test::serial;

    fn builder() -> AppBootstrapper {
        AppBootstrapper::new(ModuleDescriptor::new("app"))
    }

    #[tokio::test]
    #[serial]
    async fn explicit_port_beats_the_environment() {
        std::env::set_var("PORT", "4000");
        let materialized = builder().with_port(9090).materialize().await.unwrap();
        assert_eq!(materialized.port(), 9090);
        std::env::remove_var("PORT");
    }

    #[tokio::test]
    #[serial]
    async fn default_port_is_3000() {
        std::env::remove_var("PORT");
        let materialized = builder().materialize().await.unwrap();
        assert_eq!(materialized.port(), 3000);
    }

    #[tokio::test]
    #[serial]
    async fn malformed_port_env_is_a_configuration_error() {
        std::env::set_var("PORT", "not-a-port");
        let err = builder().materialize().await.unwrap_err();
        assert!(matches!(err, BootstrapError::Configuration(_)));
        std::env::remove_var("PORT");
    }

    #[tokio::test]
    async fn import_order_is_root_then_features() {
        let materialized = builder()
            .with_module(ModuleDescriptor::new("database"))
            .with_module(ModuleDescriptor::new("health"))
            .materialize()
            .await
            .unwrap();
        assert_eq!(materialized.import_names(), &["app", "database", "health"]);
    }

    #[tokio::test]
    async fn swagger_reports_the_serving_path() {
        let materialized = builder()
            .with_swagger(crate::openapi::SwaggerOptions::default().with_path("/api-docs"))
            .materialize()
            .await
            .unwrap();
        assert_eq!(materialized.docs_path(), Some("/api-docs"));
    }

    #[tokio::test]
    async fn no_swagger_means_no_docs_path() {
        let materialized = builder().materialize().await.unwrap();
        assert_eq!(materialized.docs_path(), None);
    }
}
