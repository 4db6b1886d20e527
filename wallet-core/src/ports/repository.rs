//! Repository port - storage abstraction

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{Product, Transaction, User};

/// A compare-and-swap balance update
///
/// Storage applies it only if the user's stored version still equals
/// `expected_version`, then sets the version to `expected_version + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceUpdate {
    pub user_id: Uuid,
    pub expected_version: i64,
    pub new_balance: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl BalanceUpdate {
    pub fn next_version(&self) -> i64 {
        self.expected_version + 1
    }
}

/// Everything one ledger operation writes, committed as a single unit
#[derive(Debug, Clone, Default)]
pub struct LedgerCommit {
    pub updates: Vec<BalanceUpdate>,
    pub entries: Vec<Transaction>,
}

/// Outcome of [`Repository::commit_ledger`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// A balance update found a different version; nothing was written
    VersionConflict,
}

/// Aggregate counts across the whole store
#[derive(Debug, Clone, Default, Serialize)]
pub struct LedgerTotals {
    pub users: i64,
    pub transactions: i64,
    pub products: i64,
    pub funds_held: Decimal,
}

/// Storage repository abstraction
///
/// Implementations must make `commit_ledger` atomic: either every update
/// and entry is durable, or none is.
pub trait Repository: Send + Sync {
    // === Users ===

    /// Insert a new user; `false` if the username is already taken
    fn insert_user(&self, user: &User) -> Result<bool>;

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    // === Ledger ===

    /// Apply balance updates and append entries in one transaction
    fn commit_ledger(&self, commit: &LedgerCommit) -> Result<CommitOutcome>;

    /// All entries for a user, most recent first
    fn transactions_for_user(&self, user_id: Uuid) -> Result<Vec<Transaction>>;

    // === Catalog ===

    fn insert_product(&self, product: &Product) -> Result<()>;

    fn list_products(&self) -> Result<Vec<Product>>;

    fn find_product(&self, id: Uuid) -> Result<Option<Product>>;

    // === Status ===

    fn ledger_totals(&self) -> Result<LedgerTotals>;
}
