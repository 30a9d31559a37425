//! armature - batteries-included bootstrap for axum applications
//!
//! A fluent builder over axum that turns a root module and a chain of
//! `with_*` calls into a configured, running HTTP server: feature modules
//! with providers and install hooks, filesystem component discovery,
//! database/cache/config starters, health and metrics endpoints, API
//! docs, middleware presets, and a single top-level failure handler.
//!
//! ```rust,no_run
//! use armature::bootstrap::launch;
//! use armature::modules::ModuleDescriptor;
//!
//! #[tokio::main]
//! async fn main() {
//!     launch(ModuleDescriptor::new("app"), None, |app| {
//!         app.with_global_prefix("api")
//!             .with_health(Default::default())
//!             .with_metrics(Default::default())
//!             .with_development_defaults()
//!     })
//!     .await;
//! }
//! ```

pub mod bootstrap;
pub mod config;
pub mod controller;
pub mod discovery;
pub mod errors;
pub mod health;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod openapi;
pub mod plugins;
pub mod server;
pub mod services;
pub mod starters;

pub use bootstrap::{launch, try_launch, AppBootstrapper, MaterializedApp};
pub use controller::Controller;
pub use errors::{BootstrapError, BootstrapResult};
pub use modules::ModuleDescriptor;
pub use plugins::{Interceptor, Plugin};
pub use server::App;
pub use services::ServiceMap;
