//! Request extractors: Basic authentication and validated JSON bodies

use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts, Json, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use tracing::debug;

use wallet_core::services::{LogEvent, LoggingService};
use wallet_core::{Caller, WalletService};

use super::error::ApiError;
use super::handlers::blocking;

/// The authenticated caller, resolved from the `Authorization` header
///
/// Password verification runs on the blocking pool.
pub struct Authenticated(pub Caller);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let wallet = parts
            .extensions
            .get::<Arc<WalletService>>()
            .cloned()
            .ok_or_else(ApiError::internal)?;

        // A header that is not visible ASCII can never be valid Basic credentials
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .map(|value| value.to_str().unwrap_or_default().to_owned());

        let caller = blocking(move || wallet.authenticate(header.as_deref())).await?;
        Ok(Self(caller))
    }
}

/// A JSON body that must match `T` exactly
///
/// Missing, mistyped, or unknown fields are a 400 with `{"error": ...}`,
/// before any wallet operation runs.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let route = req.uri().path().to_owned();
        let events = req.extensions().get::<Arc<LoggingService>>().cloned();

        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                let message = rejection.body_text();
                debug!(route = %route, "rejected request body: {}", message);
                if let Some(events) = events {
                    let _ = tokio::task::spawn_blocking(move || {
                        events.log(LogEvent::new("request_rejected").with_route(route))
                    });
                }
                Err(ApiError::bad_request(message))
            }
        }
    }
}
