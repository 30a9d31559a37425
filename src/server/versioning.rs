//! Header-based API versioning.
//!
//! Requests may carry a version header; when absent the default version is
//! assumed. The resolved version is exposed to handlers through request
//! extensions and stamped on every response.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use axum::Router;

/// Opaque versioning configuration.
#[derive(Debug, Clone)]
pub struct VersioningOptions {
    /// Header consulted on requests and stamped on responses.
    pub header: String,
    /// Version assumed when the header is absent.
    pub default_version: String,
}

impl Default for VersioningOptions {
    fn default() -> Self {
        Self {
            header: "x-api-version".to_string(),
            default_version: "1".to_string(),
        }
    }
}

/// The API version resolved for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersion(pub String);

impl VersioningOptions {
    /// Install the versioning middleware on the router.
    pub fn apply(self, router: Router) -> Router {
        let header = self.header.to_ascii_lowercase();
        let default_version = self.default_version;
        router.layer(axum::middleware::from_fn(
            move |mut request: Request, next: Next| {
                let header = header.clone();
                let default_version = default_version.clone();
                async move {
                    let version = request
                        .headers()
                        .get(&header)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or(&default_version)
                        .to_string();
                    request.extensions_mut().insert(ApiVersion(version.clone()));

                    let mut response: Response = next.run(request).await;
                    if let Ok(value) = HeaderValue::from_str(&version) {
                        if let Ok(name) =
                            axum::http::HeaderName::from_bytes(header.as_bytes())
                        {
                            response.headers_mut().insert(name, value);
                        }
                    }
                    response
                }
            },
        ))
    }
}
