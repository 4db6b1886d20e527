//! Result and error types for the core library

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Core library error type
///
/// Every variant is a business outcome the caller can act on, except
/// `Database`, which carries adapter failures whose details are not meant
/// for end users.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WalletError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("{0}")]
    InvalidInput(String),

    #[error("User already exists: {0}")]
    DuplicateUser(String),

    #[error("Recipient not found: {0}")]
    RecipientNotFound(String),

    #[error("Invalid product: {0}")]
    ProductNotFound(Uuid),

    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        available: Decimal,
        requested: Decimal,
    },

    #[error("Currency service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl WalletError {
    /// Create an invalid input error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a currency service error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    /// Create a concurrent modification error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Stable machine-readable name, used for event logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "authentication_required",
            Self::InvalidInput(_) => "invalid_input",
            Self::DuplicateUser(_) => "duplicate_user",
            Self::RecipientNotFound(_) => "recipient_not_found",
            Self::ProductNotFound(_) => "product_not_found",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Conflict(_) => "conflict",
            Self::Database(_) => "database",
        }
    }
}

impl From<anyhow::Error> for WalletError {
    fn from(e: anyhow::Error) -> Self {
        Self::Database(e.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, WalletError>;
