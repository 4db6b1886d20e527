//! HTTP API for the wallet
//!
//! axum handlers over a shared `WalletService`. Every wallet call runs on
//! the blocking pool; the async workers only parse and respond.

mod dto;
mod error;
mod extract;
mod handlers;
mod routes;

use anyhow::{Context, Result};
use axum::Router;
use tracing::info;

pub use routes::router;

/// Serve `router` on `bind` until Ctrl-C or SIGTERM
pub async fn serve(router: Router, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("HTTP server bound on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(wait_for_shutdown())
        .await
        .context("HTTP server failed")?;

    info!("HTTP server stopped");
    Ok(())
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {},
                    _ = tokio::signal::ctrl_c() => {},
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("HTTP server shutting down gracefully");
}
