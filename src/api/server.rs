//! HTTP server lifecycle — binds the listener, mounts the dashboard
//! router, and runs until shutdown is signalled.
//!
//! Pattern: bind → spawn background task → return handle with shutdown
//! channel.

use std::net::SocketAddr;

use tokio::sync::oneshot;

use super::router::dashboard_router;
use super::types::ApiContext;

/// Handle to a running dashboard API server.
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServer {
    /// Shut down the server gracefully.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Dashboard API server shutdown signal sent");
        }
    }
}

/// Start the dashboard API server.
///
/// Binds to `bind_addr`, mounts `dashboard_router`, and spawns the axum
/// server in a background tokio task. Returns a handle with the bound
/// address and a shutdown channel.
pub async fn start_server(ctx: ApiContext, bind_addr: &str) -> Result<ApiServer, String> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|e| format!("Failed to bind dashboard API server on {bind_addr}: {e}"))?;

    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    tracing::info!(%addr, "Dashboard API server binding");

    let app = dashboard_router(ctx);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
        if let Err(e) = result {
            tracing::error!(error = %e, "Dashboard API server exited with error");
        }
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
    })
}
