//! Application handle and server plumbing.

pub mod adapter;
pub mod app;
pub mod cors;
pub mod lifecycle;
pub mod versioning;

pub use adapter::{resolve_base_url, BoundListener, NetworkAdapter, TcpAdapter};
pub use app::App;
pub use cors::CorsOptions;
pub use versioning::{ApiVersion, VersioningOptions};
