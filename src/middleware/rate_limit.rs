//! Rate limiting plugin backed by a governor direct limiter.

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

use crate::config::ConfigError;
use crate::errors::BootstrapResult;
use crate::plugins::Plugin;
use crate::server::App;

/// Process-wide request quota.
#[derive(Debug, Clone)]
pub struct RateLimitOptions {
    /// Sustained requests per second.
    pub per_second: u32,
    /// Burst capacity above the sustained rate.
    pub burst: u32,
}

impl Default for RateLimitOptions {
    fn default() -> Self {
        Self {
            per_second: 50,
            burst: 100,
        }
    }
}

/// Rejects requests over quota with `429 Too Many Requests`. Part of the
/// production preset.
#[derive(Debug, Default)]
pub struct RateLimitPlugin {
    options: RateLimitOptions,
}

impl RateLimitPlugin {
    pub fn new(options: RateLimitOptions) -> Self {
        Self { options }
    }

    fn build_limiter(&self) -> Result<DefaultDirectRateLimiter, ConfigError> {
        let per_second = NonZeroU32::new(self.options.per_second).ok_or_else(|| {
            ConfigError::invalid_value("rate_limit.per_second", "0", "a positive rate")
        })?;
        let burst = NonZeroU32::new(self.options.burst).ok_or_else(|| {
            ConfigError::invalid_value("rate_limit.burst", "0", "a positive burst size")
        })?;
        Ok(RateLimiter::direct(
            Quota::per_second(per_second).allow_burst(burst),
        ))
    }
}

#[async_trait]
impl Plugin for RateLimitPlugin {
    fn name(&self) -> &str {
        "rate-limit"
    }

    async fn apply(&self, app: &mut App) -> BootstrapResult<()> {
        let limiter = Arc::new(self.build_limiter()?);
        app.map_router(move |router| {
            router.layer(axum::middleware::from_fn(
                move |request: Request, next: Next| {
                    let limiter = limiter.clone();
                    async move {
                        if limiter.check().is_err() {
                            return StatusCode::TOO_MANY_REQUESTS.into_response();
                        }
                        let response: Response = next.run(request).await;
                        response
                    }
                },
            ))
        });
        Ok(())
    }
}
