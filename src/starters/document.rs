//! Document store starter.
//!
//! Registers a [`DocumentStoreConfig`] carrying a parsed connection URL.
//! The starter validates configuration only; driver wiring is the
//! application's concern.

use url::Url;

use crate::config::{require_env, ConfigError};
use crate::modules::ModuleDescriptor;

const DEFAULT_ENV_VAR: &str = "MONGO_URI";

/// Document store starter options.
#[derive(Debug, Clone, Default)]
pub struct DocumentStoreOptions {
    /// Explicit connection string; overrides the environment.
    pub url: Option<String>,
    /// Environment variable consulted when `url` is unset.
    pub env_var: Option<String>,
}

impl DocumentStoreOptions {
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

/// Validated document store connection configuration.
#[derive(Debug, Clone)]
pub struct DocumentStoreConfig {
    pub url: Url,
}

impl DocumentStoreConfig {
    fn resolve(options: &DocumentStoreOptions) -> Result<Self, ConfigError> {
        let raw = match &options.url {
            Some(url) => url.clone(),
            None => {
                let var = options.env_var.as_deref().unwrap_or(DEFAULT_ENV_VAR);
                require_env(var)?
            }
        };
        let url = Url::parse(&raw).map_err(|e| {
            ConfigError::invalid_value(
                "document_store.url",
                raw,
                format!("a connection URL ({})", e),
            )
        })?;
        Ok(Self { url })
    }
}

/// Build the document store feature module.
pub fn document_store_module(options: DocumentStoreOptions) -> ModuleDescriptor {
    ModuleDescriptor::new("document-store").with_provider(move |services| {
        let config = DocumentStoreConfig::resolve(&options)?;
        services.insert(config);
        Ok(())
    })
}
