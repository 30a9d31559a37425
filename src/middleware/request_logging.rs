//! Request logging plugin.

use async_trait::async_trait;
use tower_http::trace::TraceLayer;

use crate::errors::BootstrapResult;
use crate::plugins::Plugin;
use crate::server::App;

/// Installs `tower-http` request tracing. Part of the development preset.
#[derive(Debug, Default)]
pub struct RequestLoggingPlugin;

#[async_trait]
impl Plugin for RequestLoggingPlugin {
    fn name(&self) -> &str {
        "request-logging"
    }

    async fn apply(&self, app: &mut App) -> BootstrapResult<()> {
        app.map_router(|router| router.layer(TraceLayer::new_for_http()));
        Ok(())
    }
}
