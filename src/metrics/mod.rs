//! Metrics endpoint module.
//!
//! Records one histogram observation per completed HTTP request, labeled
//! by method, resolved route pattern (raw path when no pattern matched),
//! and status code, and exposes the text-format payload on one GET route.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use prometheus::{Encoder, HistogramOpts, HistogramVec, Registry, TextEncoder};
use tracing::error;

use crate::config::{ConfigError, ServerDefaults};
use crate::modules::ModuleDescriptor;
use crate::server::App;

/// Fixed histogram bucket boundaries, in seconds.
pub const REQUEST_DURATION_BUCKETS: &[f64] = &[0.1, 0.3, 0.5, 0.7, 1.0, 3.0, 5.0, 10.0];

/// Metrics endpoint configuration.
#[derive(Debug, Clone)]
pub struct MetricsOptions {
    /// Route the exposition endpoint is mounted at.
    pub path: String,
}

impl Default for MetricsOptions {
    fn default() -> Self {
        Self {
            path: ServerDefaults::METRICS_PATH.to_string(),
        }
    }
}

/// Request-duration histogram with its own registry.
pub struct HttpMetrics {
    registry: Registry,
    request_duration: HistogramVec,
}

impl HttpMetrics {
    pub fn new() -> Result<Self, ConfigError> {
        let registry = Registry::new();
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(REQUEST_DURATION_BUCKETS.to_vec()),
            &["method", "route", "status"],
        )
        .map_err(|e| ConfigError::validation_failed(format!("metrics histogram: {}", e)))?;
        registry
            .register(Box::new(request_duration.clone()))
            .map_err(|e| ConfigError::validation_failed(format!("metrics registry: {}", e)))?;
        Ok(Self {
            registry,
            request_duration,
        })
    }

    /// Record one completed request.
    pub fn observe(&self, method: &str, route: &str, status: u16, seconds: f64) {
        self.request_duration
            .with_label_values(&[method, route, &status.to_string()])
            .observe(seconds);
    }

    /// Text exposition format and its content type.
    pub fn export(&self) -> Result<(String, String), prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        let body = String::from_utf8(buffer).unwrap_or_default();
        Ok((body, encoder.format_type().to_string()))
    }
}

impl std::fmt::Debug for HttpMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMetrics").finish()
    }
}

/// Build the metrics feature module: registers the `HttpMetrics` provider
/// and mounts the exposition route. The observation layer is applied
/// separately, once every route is mounted.
pub fn metrics_module(options: MetricsOptions) -> ModuleDescriptor {
    ModuleDescriptor::new("metrics")
        .with_provider(|services| {
            let metrics = Arc::new(HttpMetrics::new()?);
            services.insert_arc(metrics);
            Ok(())
        })
        .with_install(move |app| {
            let Some(metrics) = app.services().get::<HttpMetrics>() else {
                error!("metrics provider missing at install time");
                return;
            };

            let handler = move || {
                let metrics = metrics.clone();
                async move {
                    match metrics.export() {
                        Ok((body, content_type)) => {
                            ([(CONTENT_TYPE, content_type)], body).into_response()
                        }
                        Err(e) => {
                            error!("metrics export failed: {}", e);
                            StatusCode::INTERNAL_SERVER_ERROR.into_response()
                        }
                    }
                }
            };
            app.route(&options.path, get(handler));
        })
}

/// Wrap the finished router with the per-request observation middleware
/// when an `HttpMetrics` provider is registered.
///
/// This runs last in materialization, after every route is mounted, so
/// requests to routes added by later modules, setup actions, and the docs
/// route are observed too.
pub(crate) fn install_observation(app: &mut App) {
    let Some(metrics) = app.services().get::<HttpMetrics>() else {
        return;
    };

    app.map_router(move |router| {
        router.layer(axum::middleware::from_fn(
            move |request: Request, next: Next| {
                let metrics = metrics.clone();
                async move {
                    let method = request.method().as_str().to_string();
                    let route = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(|p| p.as_str().to_string())
                        .unwrap_or_else(|| request.uri().path().to_string());
                    let start = Instant::now();

                    let response: Response = next.run(request).await;

                    metrics.observe(
                        &method,
                        &route,
                        response.status().as_u16(),
                        start.elapsed().as_secs_f64(),
                    );
                    response
                }
            },
        ))
    });
}
