//! Standard middleware and bundled plugins.

pub mod rate_limit;
pub mod request_logging;
pub mod security_headers;

pub use rate_limit::{RateLimitOptions, RateLimitPlugin};
pub use request_logging::RequestLoggingPlugin;
pub use security_headers::SecurityHeadersOptions;
