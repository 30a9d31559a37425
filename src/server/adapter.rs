//! Network adapter seam.
//!
//! The engine binds and serves through these traits so bootstrap is
//! testable without opening sockets: tests supply a recording adapter, the
//! default is a Tokio TCP listener.

use std::net::SocketAddr;

use async_trait::async_trait;
use axum::Router;

use crate::errors::{BootstrapError, BootstrapResult};
use crate::server::lifecycle;

/// Binds the network listener for the materialized application.
#[async_trait]
pub trait NetworkAdapter: Send + Sync {
    async fn bind(&self, addr: SocketAddr) -> BootstrapResult<Box<dyn BoundListener>>;
}

/// A bound listener: reports its local address, then serves the router.
#[async_trait]
pub trait BoundListener: Send {
    fn local_addr(&self) -> SocketAddr;

    /// Serve until the process stops. With `graceful` set, shutdown waits
    /// on the interrupt/terminate signals.
    async fn serve(self: Box<Self>, router: Router, graceful: bool) -> BootstrapResult<()>;
}

/// Default adapter backed by `tokio::net::TcpListener`.
#[derive(Debug, Default)]
pub struct TcpAdapter;

#[async_trait]
impl NetworkAdapter for TcpAdapter {
    async fn bind(&self, addr: SocketAddr) -> BootstrapResult<Box<dyn BoundListener>> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| BootstrapError::startup(format!("failed to bind to {}: {}", addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| BootstrapError::startup(format!("failed to read local address: {}", e)))?;
        Ok(Box::new(TcpBound {
            listener,
            local_addr,
        }))
    }
}

struct TcpBound {
    listener: tokio::net::TcpListener,
    local_addr: SocketAddr,
}

#[async_trait]
impl BoundListener for TcpBound {
    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    async fn serve(self: Box<Self>, router: Router, graceful: bool) -> BootstrapResult<()> {
        lifecycle::serve(self.listener, router, graceful).await
    }
}

/// Externally reachable base URL for a bound address. An unspecified bind
/// IP is rendered as `localhost`.
pub fn resolve_base_url(addr: SocketAddr) -> String {
    if addr.ip().is_unspecified() {
        format!("http://localhost:{}", addr.port())
    } else {
        format!("http://{}", addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unspecified_bind_renders_as_localhost() {
        let addr: SocketAddr = "0.0.0.0:3000".parse().unwrap();
        assert_eq!(resolve_base_url(addr), "http://localhost:3000");
    }

    #[test]
    fn concrete_bind_renders_verbatim() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        assert_eq!(resolve_base_url(addr), "http://127.0.0.1:8080");
    }

    #[tokio::test]
    async fn tcp_adapter_binds_an_ephemeral_port() {
        let adapter = TcpAdapter;
        let bound = adapter.bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        assert_ne!(bound.local_addr().port(), 0);
    }
}
