//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod credentials;
pub mod money;
mod product;
pub mod result;
mod transaction;
mod user;

pub use credentials::BasicCredentials;
pub use product::{NewProduct, Product};
pub use transaction::{Transaction, TransactionKind, TransactionSource};
pub use user::{User, MAX_PASSWORD_LEN, MAX_USERNAME_LEN};

use chrono::{DateTime, SubsecRound, Utc};

/// Fractional-second digits kept in stored timestamps
pub const TIMESTAMP_PRECISION: u16 = 6;

/// Current time at the precision the store keeps
///
/// Every timestamp on a domain record comes from here, so a record built
/// in memory compares equal to the same record read back from storage.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(TIMESTAMP_PRECISION)
}
