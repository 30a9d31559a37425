//! Environment-driven configuration.
//!
//! Every tunable in the kit defaults from an environment variable and falls
//! back to a fixed default, so an application boots with zero configuration
//! and hardens through its environment. Application-level config structs
//! implement [`FromEnvConfig`] and are registered through
//! [`crate::starters::config_module`], which validates them during
//! materialization.

use std::env;

/// Fixed defaults for the bootstrap kit.
pub struct ServerDefaults;

impl ServerDefaults {
    /// Default network port when `PORT` is unset.
    pub const PORT: u16 = 3000;
    /// Environment variable consulted for the network port.
    pub const PORT_ENV: &'static str = "PORT";
    /// Default path for the rendered API documentation.
    pub const DOCS_PATH: &'static str = "/docs";
    /// Default path for the health endpoint.
    pub const HEALTH_PATH: &'static str = "/health";
    /// Default path for the metrics endpoint.
    pub const METRICS_PATH: &'static str = "/metrics";
}

/// Configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {name}")]
    MissingEnv { name: String },

    #[error("Invalid value for {field}: '{value}' (expected {expected})")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Configuration validation failed: {message}")]
    ValidationFailed { message: String },
}

impl ConfigError {
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }
}

/// Trait for configuration structs resolved from the environment.
///
/// `from_env` reads and parses; `validate` enforces cross-field rules.
/// Both run at materialization time and surface as configuration errors
/// through the top-level bootstrap handler.
pub trait FromEnvConfig: Sized + Send + Sync + 'static {
    fn from_env() -> Result<Self, ConfigError>;

    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Read an environment variable, falling back to a default.
pub fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read a required environment variable.
pub fn require_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnv {
        name: key.to_string(),
    })
}

/// Resolve the network port: explicit override, else `PORT`, else 3000.
///
/// An unparsable `PORT` is a configuration error, not a silent fallback.
pub fn resolve_port(explicit: Option<u16>) -> Result<u16, ConfigError> {
    if let Some(port) = explicit {
        return Ok(port);
    }
    match env::var(ServerDefaults::PORT_ENV) {
        Ok(raw) => raw.parse::<u16>().map_err(|_| {
            ConfigError::invalid_value(ServerDefaults::PORT_ENV, raw, "a TCP port number")
        }),
        Err(_) => Ok(ServerDefaults::PORT),
    }
}
