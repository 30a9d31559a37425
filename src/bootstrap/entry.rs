//! Top-level entry point.
//!
//! [`launch`] is the single place bootstrap failures are handled: it
//! initializes logging, runs the configure callback and the full
//! materialize/bind/serve sequence, and on any failure logs the error with
//! its source chain and exits with status 1. [`try_launch`] is the same
//! sequence without the exit, for callers that need the error back.

use std::panic::AssertUnwindSafe;

use tracing::error;
use tracing_subscriber::EnvFilter;

use super::builder::AppBootstrapper;
use crate::errors::{BootstrapError, BootstrapResult};
use crate::modules::ModuleDescriptor;
use crate::server::NetworkAdapter;

/// Configure and run the application, returning any bootstrap failure.
///
/// The configure callback runs inside a panic boundary: a panicking
/// callback surfaces as [`BootstrapError::CallbackPanicked`] instead of
/// unwinding through the runtime.
pub async fn try_launch(
    root: ModuleDescriptor,
    adapter: Option<Box<dyn NetworkAdapter>>,
    configure: impl FnOnce(AppBootstrapper) -> AppBootstrapper,
) -> BootstrapResult<()> {
    let bootstrapper = match adapter {
        Some(adapter) => AppBootstrapper::with_adapter(root, adapter),
        None => AppBootstrapper::new(root),
    };

    let configured = std::panic::catch_unwind(AssertUnwindSafe(move || configure(bootstrapper)))
        .map_err(|payload| BootstrapError::CallbackPanicked {
            message: panic_message(payload),
        })?;

    configured.listen().await
}

/// Configure and run the application; on failure, log and exit(1).
///
/// This is the only place the process exits on a bootstrap error, so every
/// failure mode (configuration, discovery, plugins, server startup, a
/// panicking callback) funnels into one log line and one exit status.
pub async fn launch(
    root: ModuleDescriptor,
    adapter: Option<Box<dyn NetworkAdapter>>,
    configure: impl FnOnce(AppBootstrapper) -> AppBootstrapper,
) {
    init_tracing();

    if let Err(e) = try_launch(root, adapter, configure).await {
        error!("application failed to start: {}", e);
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            error!("  caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Ignore re-initialization; a host may have installed a subscriber.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "opaque panic payload".to_string()
    }
}
