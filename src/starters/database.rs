//! Postgres starter.
//!
//! Registers a [`DatabaseConfig`] resolved from the options or the
//! environment. Connecting is left to the application (a setup action or
//! plugin typically calls [`DatabaseConfig::connect`] and registers the
//! pool plus a health indicator).

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::{require_env, ConfigError};
use crate::health::DatabasePing;
use crate::modules::ModuleDescriptor;

const DEFAULT_ENV_VAR: &str = "DATABASE_URL";

/// Database starter options.
#[derive(Debug, Clone, Default)]
pub struct DatabaseOptions {
    /// Explicit connection string; overrides the environment.
    pub url: Option<String>,
    /// Environment variable consulted when `url` is unset.
    pub env_var: Option<String>,
    /// Maximum pool size.
    pub max_connections: Option<u32>,
}

impl DatabaseOptions {
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

/// Resolved database connection configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    fn resolve(options: &DatabaseOptions) -> Result<Self, ConfigError> {
        let url = match &options.url {
            Some(url) => url.clone(),
            None => {
                let var = options.env_var.as_deref().unwrap_or(DEFAULT_ENV_VAR);
                require_env(var)?
            }
        };
        if url.is_empty() {
            return Err(ConfigError::invalid_value(
                "database.url",
                url,
                "a non-empty connection string",
            ));
        }
        Ok(Self {
            url,
            max_connections: options.max_connections.unwrap_or(5),
        })
    }

    /// Connect a pool with the configured limits.
    pub async fn connect(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.url)
            .await
    }
}

#[async_trait]
impl DatabasePing for PgPool {
    async fn ping(&self) -> Result<(), String> {
        sqlx::query("SELECT 1")
            .execute(self)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Build the database feature module.
pub fn database_module(options: DatabaseOptions) -> ModuleDescriptor {
    ModuleDescriptor::new("database").with_provider(move |services| {
        let config = DatabaseConfig::resolve(&options)?;
        services.insert(config);
        Ok(())
    })
}
