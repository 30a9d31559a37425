//! Starters: translators from simplified options to feature modules.
//!
//! Each starter produces a [`crate::modules::ModuleDescriptor`] whose
//! provider setup defers environment resolution to materialization time,
//! so builder calls stay infallible and misconfiguration surfaces through
//! the single top-level bootstrap handler.

pub mod cache;
pub mod config_check;
pub mod database;
pub mod document;

pub use cache::{cache_module, CacheConfig, CacheOptions};
pub use config_check::config_module;
pub use database::{database_module, DatabaseConfig, DatabaseOptions};
pub use document::{document_store_module, DocumentStoreConfig, DocumentStoreOptions};
