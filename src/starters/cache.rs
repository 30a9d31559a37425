//! Redis cache starter.
//!
//! Registers a [`CacheConfig`] and a validated `redis::Client`. Client
//! construction parses the connection string without touching the network,
//! so a malformed URL surfaces as a configuration-time error.

use crate::config::{require_env, ConfigError};
use crate::modules::ModuleDescriptor;

const DEFAULT_ENV_VAR: &str = "REDIS_URL";

/// Cache starter options.
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// Explicit connection string; overrides the environment.
    pub url: Option<String>,
    /// Environment variable consulted when `url` is unset.
    pub env_var: Option<String>,
}

impl CacheOptions {
    pub fn from_env_var(name: impl Into<String>) -> Self {
        Self {
            env_var: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }
}

/// Resolved cache connection configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub url: String,
}

impl CacheConfig {
    fn resolve(options: &CacheOptions) -> Result<Self, ConfigError> {
        let url = match &options.url {
            Some(url) => url.clone(),
            None => {
                let var = options.env_var.as_deref().unwrap_or(DEFAULT_ENV_VAR);
                require_env(var)?
            }
        };
        Ok(Self { url })
    }

    /// Build the client, validating the connection string.
    pub fn client(&self) -> Result<redis::Client, ConfigError> {
        redis::Client::open(self.url.as_str()).map_err(|e| {
            ConfigError::invalid_value("cache.url", self.url.clone(), format!("a redis URL ({})", e))
        })
    }
}

/// Build the cache feature module.
pub fn cache_module(options: CacheOptions) -> ModuleDescriptor {
    ModuleDescriptor::new("cache").with_provider(move |services| {
        let config = CacheConfig::resolve(&options)?;
        let client = config.client()?;
        services.insert(config);
        services.insert(client);
        Ok(())
    })
}
