//! Error types for configuration and bootstrap.
//!
//! Configuration-time failures (missing environment values, invalid values,
//! schema validation) are `ConfigError`s; everything that can abort the
//! bootstrap sequence funnels into `BootstrapError`, which is caught exactly
//! once at the top-level entry point.

use crate::config::ConfigError;

/// Error type for bootstrap operations
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Configuration failed: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Bootstrap callback panicked: {message}")]
    CallbackPanicked { message: String },

    #[error("Plugin '{plugin}' failed during apply: {message}")]
    PluginFailed { plugin: String, message: String },

    #[error("Component discovery failed: {message}")]
    DiscoveryFailed { message: String },

    #[error("Server startup failed: {message}")]
    ServerStartupFailed { message: String },
}

impl BootstrapError {
    pub fn startup(message: impl Into<String>) -> Self {
        Self::ServerStartupFailed {
            message: message.into(),
        }
    }
}

/// Result type for bootstrap operations
pub type BootstrapResult<T> = Result<T, BootstrapError>;
