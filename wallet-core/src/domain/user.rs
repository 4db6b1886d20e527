//! User domain model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Longest accepted username, in characters
pub const MAX_USERNAME_LEN: usize = 64;

/// Longest accepted password, in bytes
pub const MAX_PASSWORD_LEN: usize = 1024;

/// A registered wallet holder
///
/// `version` counts ledger mutations applied to this user. Storage only
/// accepts a balance update whose expected version matches, and the value
/// after the update becomes the `sequence` of the resulting transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub balance: Decimal,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a freshly registered user with a zero balance
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let now = super::now();
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash: password_hash.into(),
            balance: Decimal::ZERO,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
