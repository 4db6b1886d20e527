//! Serve command - run the HTTP API

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use super::open_context;
use crate::server;
use wallet_core::EntryPoint;

pub fn run(bind: Option<String>) -> Result<()> {
    // The wallet (and its blocking HTTP client) is built and dropped
    // outside the async runtime.
    let ctx = open_context(EntryPoint::Server)?;
    let bind = bind.unwrap_or_else(|| ctx.config.server.bind.clone());
    let app = server::router(Arc::clone(&ctx.wallet), ctx.logger.clone());

    if let Some(logger) = &ctx.logger {
        let _ = logger.log_event("server_started");
    }
    info!(
        base_currency = ctx.wallet.base_currency(),
        rates = ctx.wallet.rate_provider(),
        "starting wallet server"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(server::serve(app, &bind))?;
    drop(runtime);

    if let Some(logger) = &ctx.logger {
        let _ = logger.log_event("server_stopped");
    }
    Ok(())
}
