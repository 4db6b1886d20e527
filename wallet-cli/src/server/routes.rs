use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use wallet_core::services::LoggingService;
use wallet_core::WalletService;

use super::handlers;

/// Build the HTTP API around a wallet service
///
/// `events`, when present, receives rejected-request events; wallet
/// operations log their own.
pub fn router(wallet: Arc<WalletService>, events: Option<Arc<LoggingService>>) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::health))
        .route("/register", post(handlers::register))
        .route("/fund", post(handlers::fund))
        .route("/pay", post(handlers::pay))
        .route("/bal", get(handlers::balance))
        .route("/stmt", get(handlers::statement))
        .route(
            "/product",
            post(handlers::add_product).get(handlers::list_products),
        )
        .route("/buy", post(handlers::buy))
        .layer(Extension(wallet));

    if let Some(events) = events {
        router = router.layer(Extension(events));
    }

    router.layer(TraceLayer::new_for_http())
}
