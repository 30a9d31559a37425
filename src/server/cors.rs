//! CORS option block translated to a `tower-http` layer.

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::ConfigError;

/// Opaque CORS configuration, passed through to the framework layer only
/// when the builder sets it.
#[derive(Debug, Clone, Default)]
pub struct CorsOptions {
    /// Allowed origins. Empty means any origin.
    pub allow_origins: Vec<String>,
    /// Allowed methods. Empty means any method.
    pub allow_methods: Vec<Method>,
    /// Whether credentials are allowed. Requires explicit origins.
    pub allow_credentials: bool,
}

impl CorsOptions {
    /// Allow everything. The permissive default for development.
    pub fn permissive() -> Self {
        Self::default()
    }

    pub fn with_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    /// Translate into the framework layer.
    pub fn into_layer(self) -> Result<CorsLayer, ConfigError> {
        if self.allow_credentials && self.allow_origins.is_empty() {
            return Err(ConfigError::validation_failed(
                "CORS credentials require explicit allowed origins",
            ));
        }

        let mut layer = CorsLayer::new();

        if self.allow_origins.is_empty() {
            layer = layer.allow_origin(Any).allow_headers(Any);
        } else {
            let mut origins = Vec::with_capacity(self.allow_origins.len());
            for origin in &self.allow_origins {
                let value = HeaderValue::from_str(origin).map_err(|_| {
                    ConfigError::invalid_value("cors.allow_origins", origin.clone(), "a valid origin")
                })?;
                origins.push(value);
            }
            layer = layer.allow_origin(AllowOrigin::list(origins));
        }

        if self.allow_methods.is_empty() {
            if self.allow_origins.is_empty() {
                layer = layer.allow_methods(Any);
            }
        } else {
            layer = layer.allow_methods(self.allow_methods);
        }

        if self.allow_credentials {
            layer = layer.allow_credentials(true);
        }

        Ok(layer)
    }
}
