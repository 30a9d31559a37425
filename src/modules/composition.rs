//! The composition root: the single aggregate from which the application
//! is constructed.
//!
//! Synthesized exactly once per bootstrap, from the builder state frozen at
//! materialization time. Instantiation runs module providers in import
//! order, then composition-level providers (discovered injectables followed
//! by named-token bindings), freezes the service map, mounts controllers,
//! and finally runs each module's install hooks.

use std::sync::Arc;

use axum::Router;
use tracing::{debug, info};

use super::{InstallSetup, ModuleDescriptor, ProviderSetup};
use crate::config::ConfigError;
use crate::controller::Controller;
use crate::server::App;

/// Aggregate of everything the application is built from.
pub struct CompositionRoot {
    imports: Vec<ModuleDescriptor>,
    providers: Vec<ProviderSetup>,
    controllers: Vec<Arc<dyn Controller>>,
}

impl CompositionRoot {
    /// Synthesize the root. `imports` must already be ordered: the caller's
    /// root module first, feature modules after, in registration order.
    pub fn new(
        imports: Vec<ModuleDescriptor>,
        providers: Vec<ProviderSetup>,
        controllers: Vec<Arc<dyn Controller>>,
    ) -> Self {
        Self {
            imports,
            providers,
            controllers,
        }
    }

    /// Names of the imported modules, in import order.
    pub fn import_names(&self) -> Vec<&str> {
        self.imports.iter().map(|m| m.name()).collect()
    }

    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }

    /// Construct the application object from this root.
    pub fn instantiate(self) -> Result<App, ConfigError> {
        let mut services = crate::services::ServiceMap::new();
        let mut installs: Vec<(String, Vec<InstallSetup>)> = Vec::new();

        for module in self.imports {
            let (name, providers, module_installs) = module.into_parts();
            debug!(module = %name, "configuring module providers");
            for setup in providers {
                setup(&mut services)?;
            }
            installs.push((name, module_installs));
        }

        for setup in self.providers {
            setup(&mut services)?;
        }

        let mut router = Router::new();
        for controller in &self.controllers {
            debug!(
                controller = controller.name(),
                path = controller.base_path(),
                "mounting controller"
            );
            let base = controller.base_path();
            if base == "/" || base.is_empty() {
                router = router.merge(controller.routes());
            } else {
                router = router.nest(base, controller.routes());
            }
        }

        let mut app = App::new(router, Arc::new(services));
        for (name, module_installs) in installs {
            debug!(module = %name, "running module installs");
            for setup in module_installs {
                setup(&mut app);
            }
        }

        info!(
            controllers = self.controllers.len(),
            "composition root instantiated"
        );
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    struct UsersController;

    impl Controller for UsersController {
        fn name(&self) -> &str {
            "UsersController"
        }

        fn base_path(&self) -> &str {
            "/users"
        }

        fn routes(&self) -> Router {
            Router::new().route("/", get(|| async { "users" }))
        }
    }

    #[test]
    fn import_names_preserve_order() {
        let root = CompositionRoot::new(
            vec![
                ModuleDescriptor::new("app"),
                ModuleDescriptor::new("database"),
                ModuleDescriptor::new("health"),
            ],
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(root.import_names(), vec!["app", "database", "health"]);
    }

    #[tokio::test]
    async fn instantiation_runs_providers_in_import_order() {
        let first = ModuleDescriptor::new("first").with_provider(|services| {
            services.insert(vec!["first".to_string()]);
            Ok(())
        });
        let second = ModuleDescriptor::new("second").with_provider(|services| {
            // Appends to the value the first module registered.
            let mut order = services
                .get::<Vec<String>>()
                .map(|v| v.as_ref().clone())
                .unwrap_or_default();
            order.push("second".to_string());
            services.insert(order);
            Ok(())
        });

        let app = CompositionRoot::new(vec![first, second], Vec::new(), Vec::new())
            .instantiate()
            .unwrap();
        let order = app.services().get::<Vec<String>>().unwrap();
        assert_eq!(order.as_ref(), &vec!["first".to_string(), "second".to_string()]);
    }

    #[tokio::test]
    async fn provider_failure_aborts_instantiation() {
        let module = ModuleDescriptor::new("broken")
            .with_provider(|_| Err(ConfigError::validation_failed("boom")));
        let result =
            CompositionRoot::new(vec![module], Vec::new(), Vec::new()).instantiate();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn controllers_are_mounted_under_their_base_path() {
        let root = CompositionRoot::new(
            vec![ModuleDescriptor::new("app")],
            Vec::new(),
            vec![Arc::new(UsersController)],
        );
        assert_eq!(root.controller_count(), 1);
        let app = root.instantiate().unwrap();

        use tower::ServiceExt;
        let response = app
            .into_router()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/users/")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
}
