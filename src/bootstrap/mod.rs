//! Bootstrap: fluent builder, materialization engine, and entry point.
//!
//! One-call app startup:
//!
//! ```rust,no_run
//! use armature::bootstrap::launch;
//! use armature::modules::ModuleDescriptor;
//!
//! #[tokio::main]
//! async fn main() {
//!     launch(ModuleDescriptor::new("app"), None, |app| {
//!         app.with_health(Default::default())
//!             .with_metrics(Default::default())
//!             .with_production_defaults()
//!     })
//!     .await;
//! }
//! ```

pub mod builder;
pub mod engine;
pub mod entry;

pub use builder::AppBootstrapper;
pub use engine::MaterializedApp;
pub use entry::{launch, try_launch};
