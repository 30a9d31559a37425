//! Serving and shutdown signal handling.

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::warn;

use crate::errors::{BootstrapError, BootstrapResult};

/// Serve the router on an already-bound listener.
pub async fn serve(listener: TcpListener, router: Router, graceful: bool) -> BootstrapResult<()> {
    if graceful {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| BootstrapError::startup(format!("server error: {}", e)))
    } else {
        axum::serve(listener, router)
            .await
            .map_err(|e| BootstrapError::startup(format!("server error: {}", e)))
    }
}

/// Resolves when the process receives Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => warn!("failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            warn!("received terminate signal, shutting down gracefully");
        },
    }
}
