//! Security response headers.
//!
//! A fixed, configurable set of headers stamped on every response. The
//! strict defaults suit production APIs; individual headers can be unset.

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::Router;

/// Header set applied to every response. `None` leaves a header out.
#[derive(Debug, Clone)]
pub struct SecurityHeadersOptions {
    pub x_content_type_options: Option<String>,
    pub x_frame_options: Option<String>,
    pub strict_transport_security: Option<String>,
    pub referrer_policy: Option<String>,
}

impl Default for SecurityHeadersOptions {
    fn default() -> Self {
        Self::strict()
    }
}

impl SecurityHeadersOptions {
    /// Strict production settings.
    pub fn strict() -> Self {
        Self {
            x_content_type_options: Some("nosniff".to_string()),
            x_frame_options: Some("DENY".to_string()),
            strict_transport_security: Some(
                "max-age=63072000; includeSubDomains".to_string(),
            ),
            referrer_policy: Some("no-referrer".to_string()),
        }
    }

    fn header_pairs(&self) -> Vec<(HeaderName, HeaderValue)> {
        let mut pairs = Vec::new();
        let mut push = |name: &'static str, value: &Option<String>| {
            if let Some(value) = value {
                if let Ok(value) = HeaderValue::from_str(value) {
                    pairs.push((HeaderName::from_static(name), value));
                }
            }
        };
        push("x-content-type-options", &self.x_content_type_options);
        push("x-frame-options", &self.x_frame_options);
        push("strict-transport-security", &self.strict_transport_security);
        push("referrer-policy", &self.referrer_policy);
        pairs
    }

    /// Install the header-stamping middleware.
    pub fn apply(self, router: Router) -> Router {
        let pairs = self.header_pairs();
        router.layer(axum::middleware::from_fn(
            move |request: Request, next: Next| {
                let pairs = pairs.clone();
                async move {
                    let mut response = next.run(request).await;
                    for (name, value) in pairs {
                        response.headers_mut().insert(name, value);
                    }
                    response
                }
            },
        ))
    }
}
