use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use wallet_core::WalletError;

/// An error response: a status code and a `{"error": message}` body
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Map a wallet error to its HTTP status and client-facing message
pub fn map_wallet_error(e: &WalletError) -> ApiError {
    match e {
        WalletError::AuthenticationRequired => ApiError::new(StatusCode::UNAUTHORIZED, e.to_string()),
        WalletError::InvalidInput(_)
        | WalletError::DuplicateUser(_)
        | WalletError::RecipientNotFound(_)
        | WalletError::ProductNotFound(_)
        | WalletError::InsufficientFunds { .. } => ApiError::bad_request(e.to_string()),
        WalletError::ServiceUnavailable(msg) => {
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
        }
        WalletError::Conflict(_) => ApiError::new(StatusCode::CONFLICT, e.to_string()),
        WalletError::Database(_) => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = %e, "Database error occurred");
            ApiError::internal()
        }
    }
}

impl From<WalletError> for ApiError {
    fn from(e: WalletError) -> Self {
        map_wallet_error(&e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (WalletError::AuthenticationRequired, StatusCode::UNAUTHORIZED),
            (WalletError::invalid("bad"), StatusCode::BAD_REQUEST),
            (WalletError::DuplicateUser("a".into()), StatusCode::BAD_REQUEST),
            (WalletError::RecipientNotFound("b".into()), StatusCode::BAD_REQUEST),
            (WalletError::ProductNotFound(Uuid::nil()), StatusCode::BAD_REQUEST),
            (
                WalletError::InsufficientFunds {
                    available: Decimal::ZERO,
                    requested: Decimal::ONE,
                },
                StatusCode::BAD_REQUEST,
            ),
            (WalletError::unavailable("down"), StatusCode::INTERNAL_SERVER_ERROR),
            (WalletError::conflict("retry"), StatusCode::CONFLICT),
            (WalletError::database("disk"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(map_wallet_error(&err).status(), status, "{:?}", err);
        }
    }

    #[test]
    fn test_database_details_are_hidden() {
        let api = map_wallet_error(&WalletError::database("table wallet_users is locked"));
        assert_eq!(api.message, "Internal server error");
    }
}
