//! DuckDB repository implementation

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use duckdb::{params, Connection};
use rust_decimal::Decimal;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::result::Result as DomainResult;
use crate::domain::{Product, Transaction, TransactionKind, TransactionSource, User};
use crate::ports::{CommitOutcome, LedgerCommit, LedgerTotals, Repository};
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

const USER_COLUMNS: &str = "user_id, username, password_hash, CAST(balance AS VARCHAR), \
                            version, created_at, updated_at";

const TRANSACTION_COLUMNS: &str = "transaction_id, user_id, kind, CAST(amount AS VARCHAR), \
                                   CAST(resulting_balance AS VARCHAR), sequence, source, \
                                   counterparty_id, product_id, created_at";

const PRODUCT_COLUMNS: &str =
    "product_id, name, CAST(price AS VARCHAR), description, created_at";

/// DuckDB repository implementation
///
/// Holds a single connection behind a mutex; every method locks it for the
/// duration of one statement or one transaction.
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl DuckDbRepository {
    /// Open (or create) a database file
    ///
    /// Retries with exponential backoff when another process holds the file.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: Some(db_path.to_path_buf()),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        warn!(
                            delay_ms = delay.as_millis() as u64,
                            attempt = attempt + 1,
                            max = MAX_RETRIES,
                            "database busy, retrying: {}",
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("Failed to open database after {} retries", MAX_RETRIES)))
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_with_flags(db_path, config)
            .with_context(|| format!("Failed to open {}", db_path.display()))?;
        Ok(conn)
    }

    /// Path of the backing file, if any
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))
    }

    /// Run database migrations using the MigrationService
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.lock()?;
        MigrationService::new(&conn).run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    // === User operations ===

    pub fn insert_user(&self, user: &User) -> Result<bool> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT INTO wallet_users (user_id, username, password_hash, balance, version, created_at, updated_at)
             VALUES (?, ?, ?, CAST(? AS DECIMAL(18,2)), ?, ?, ?)
             ON CONFLICT DO NOTHING",
            params![
                user.id.to_string(),
                user.username,
                user.password_hash,
                user.balance.to_string(),
                user.version,
                format_timestamp(&user.created_at),
                format_timestamp(&user.updated_at),
            ],
        )?;
        Ok(inserted == 1)
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM wallet_users WHERE username = ?", USER_COLUMNS);
        let raw = conn
            .query_row(&sql, [username], RawUser::from_row)
            .map(Some)
            .or_else(no_rows)?;
        raw.map(RawUser::into_user).transpose()
    }

    pub fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM wallet_users WHERE user_id = ?", USER_COLUMNS);
        let raw = conn
            .query_row(&sql, [id.to_string()], RawUser::from_row)
            .map(Some)
            .or_else(no_rows)?;
        raw.map(RawUser::into_user).transpose()
    }

    // === Ledger operations ===

    /// Apply a ledger commit atomically
    ///
    /// Each balance update is a compare-and-swap on `version`. If any update
    /// misses, the transaction is rolled back and `VersionConflict` returned.
    /// Any database error also rolls back.
    pub fn commit_ledger(&self, commit: &LedgerCommit) -> Result<CommitOutcome> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        for update in &commit.updates {
            let changed = tx.execute(
                "UPDATE wallet_users
                 SET balance = CAST(? AS DECIMAL(18,2)), version = ?, updated_at = ?
                 WHERE user_id = ? AND version = ?",
                params![
                    update.new_balance.to_string(),
                    update.next_version(),
                    format_timestamp(&update.updated_at),
                    update.user_id.to_string(),
                    update.expected_version,
                ],
            )?;
            if changed != 1 {
                debug!(user_id = %update.user_id, "version check failed, rolling back");
                tx.rollback()?;
                return Ok(CommitOutcome::VersionConflict);
            }
        }

        for entry in &commit.entries {
            tx.execute(
                "INSERT INTO wallet_transactions (
                    transaction_id, user_id, kind, amount, resulting_balance, sequence,
                    source, counterparty_id, product_id, created_at
                 ) VALUES (?, ?, ?, CAST(? AS DECIMAL(18,2)), CAST(? AS DECIMAL(18,2)), ?, ?, ?, ?, ?)",
                params![
                    entry.id.to_string(),
                    entry.user_id.to_string(),
                    entry.kind.as_str(),
                    entry.amount.to_string(),
                    entry.resulting_balance.to_string(),
                    entry.sequence,
                    entry.source.as_str(),
                    entry.counterparty.map(|id| id.to_string()),
                    entry.product_id.map(|id| id.to_string()),
                    format_timestamp(&entry.timestamp),
                ],
            )?;
        }

        tx.commit()?;
        Ok(CommitOutcome::Committed)
    }

    pub fn transactions_for_user(&self, user_id: Uuid) -> Result<Vec<Transaction>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM wallet_transactions WHERE user_id = ? ORDER BY sequence DESC",
            TRANSACTION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([user_id.to_string()], RawTransaction::from_row)?;

        let mut transactions = Vec::new();
        for row in rows {
            transactions.push(row?.into_transaction()?);
        }
        Ok(transactions)
    }

    // === Product operations ===

    pub fn insert_product(&self, product: &Product) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO wallet_products (product_id, name, price, description, created_at)
             VALUES (?, ?, CAST(? AS DECIMAL(18,2)), ?, ?)",
            params![
                product.id.to_string(),
                product.name,
                product.price.to_string(),
                product.description,
                format_timestamp(&product.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn list_products(&self) -> Result<Vec<Product>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM wallet_products ORDER BY created_at, product_id",
            PRODUCT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], RawProduct::from_row)?;

        let mut products = Vec::new();
        for row in rows {
            products.push(row?.into_product()?);
        }
        Ok(products)
    }

    pub fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM wallet_products WHERE product_id = ?", PRODUCT_COLUMNS);
        let raw = conn
            .query_row(&sql, [id.to_string()], RawProduct::from_row)
            .map(Some)
            .or_else(no_rows)?;
        raw.map(RawProduct::into_product).transpose()
    }

    // === Status ===

    pub fn ledger_totals(&self) -> Result<LedgerTotals> {
        let conn = self.lock()?;
        let (users, funds): (i64, String) = conn.query_row(
            "SELECT COUNT(*), CAST(COALESCE(SUM(balance), 0) AS VARCHAR) FROM wallet_users",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let transactions: i64 =
            conn.query_row("SELECT COUNT(*) FROM wallet_transactions", [], |row| row.get(0))?;
        let products: i64 =
            conn.query_row("SELECT COUNT(*) FROM wallet_products", [], |row| row.get(0))?;

        Ok(LedgerTotals {
            users,
            transactions,
            products,
            funds_held: parse_decimal(&funds)?,
        })
    }
}

impl Repository for DuckDbRepository {
    fn insert_user(&self, user: &User) -> DomainResult<bool> {
        Ok(DuckDbRepository::insert_user(self, user)?)
    }

    fn find_user_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        Ok(DuckDbRepository::find_user_by_username(self, username)?)
    }

    fn find_user_by_id(&self, id: Uuid) -> DomainResult<Option<User>> {
        Ok(DuckDbRepository::find_user_by_id(self, id)?)
    }

    fn commit_ledger(&self, commit: &LedgerCommit) -> DomainResult<CommitOutcome> {
        Ok(DuckDbRepository::commit_ledger(self, commit)?)
    }

    fn transactions_for_user(&self, user_id: Uuid) -> DomainResult<Vec<Transaction>> {
        Ok(DuckDbRepository::transactions_for_user(self, user_id)?)
    }

    fn insert_product(&self, product: &Product) -> DomainResult<()> {
        Ok(DuckDbRepository::insert_product(self, product)?)
    }

    fn list_products(&self) -> DomainResult<Vec<Product>> {
        Ok(DuckDbRepository::list_products(self)?)
    }

    fn find_product(&self, id: Uuid) -> DomainResult<Option<Product>> {
        Ok(DuckDbRepository::find_product(self, id)?)
    }

    fn ledger_totals(&self) -> DomainResult<LedgerTotals> {
        Ok(DuckDbRepository::ledger_totals(self)?)
    }
}

// === Row mapping ===
//
// Rows are read as plain text first and converted afterwards, so a corrupt
// value surfaces as an error instead of a silently defaulted field.

struct RawUser {
    id: String,
    username: String,
    password_hash: String,
    balance: String,
    version: i64,
    created_at: String,
    updated_at: String,
}

impl RawUser {
    fn from_row(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            balance: row.get(3)?,
            version: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn into_user(self) -> Result<User> {
        Ok(User {
            id: parse_uuid(&self.id)?,
            username: self.username,
            password_hash: self.password_hash,
            balance: parse_decimal(&self.balance)?,
            version: self.version,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

struct RawTransaction {
    id: String,
    user_id: String,
    kind: String,
    amount: String,
    resulting_balance: String,
    sequence: i64,
    source: String,
    counterparty: Option<String>,
    product_id: Option<String>,
    created_at: String,
}

impl RawTransaction {
    fn from_row(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            kind: row.get(2)?,
            amount: row.get(3)?,
            resulting_balance: row.get(4)?,
            sequence: row.get(5)?,
            source: row.get(6)?,
            counterparty: row.get(7)?,
            product_id: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn into_transaction(self) -> Result<Transaction> {
        Ok(Transaction {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid(&self.user_id)?,
            kind: TransactionKind::from_str(&self.kind).map_err(|e| anyhow!(e))?,
            amount: parse_decimal(&self.amount)?,
            resulting_balance: parse_decimal(&self.resulting_balance)?,
            sequence: self.sequence,
            source: TransactionSource::from_str(&self.source).map_err(|e| anyhow!(e))?,
            counterparty: self.counterparty.as_deref().map(parse_uuid).transpose()?,
            product_id: self.product_id.as_deref().map(parse_uuid).transpose()?,
            timestamp: parse_timestamp(&self.created_at)?,
        })
    }
}

struct RawProduct {
    id: String,
    name: String,
    price: String,
    description: Option<String>,
    created_at: String,
}

impl RawProduct {
    fn from_row(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            price: row.get(2)?,
            description: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn into_product(self) -> Result<Product> {
        Ok(Product {
            id: parse_uuid(&self.id)?,
            name: self.name,
            price: parse_decimal(&self.price)?,
            description: self.description,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

/// Treat "no rows" as an absent record
fn no_rows<T>(err: duckdb::Error) -> duckdb::Result<Option<T>> {
    match err {
        duckdb::Error::QueryReturnedNoRows => Ok(None),
        other => Err(other),
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid timestamp in database: {:?}", s))
}

fn parse_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str(s).with_context(|| format!("Invalid decimal in database: {:?}", s))
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).with_context(|| format!("Invalid id in database: {:?}", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::BalanceUpdate;

    fn repo() -> DuckDbRepository {
        let repo = DuckDbRepository::in_memory().unwrap();
        repo.ensure_schema().unwrap();
        repo
    }

    fn credit(user: &User, amount: Decimal) -> LedgerCommit {
        let now = Utc::now();
        LedgerCommit {
            updates: vec![BalanceUpdate {
                user_id: user.id,
                expected_version: user.version,
                new_balance: user.balance + amount,
                updated_at: now,
            }],
            entries: vec![Transaction::new(
                user.id,
                TransactionKind::Credit,
                TransactionSource::Funding,
                amount,
                user.balance + amount,
                user.version + 1,
                now,
            )],
        }
    }

    #[test]
    fn test_user_round_trip() {
        let repo = repo();
        let user = User::new("alice", "hash");
        assert!(repo.insert_user(&user).unwrap());

        let loaded = repo.find_user_by_username("alice").unwrap().unwrap();
        assert_eq!(loaded.id, user.id);
        assert_eq!(loaded.balance, Decimal::ZERO);
        assert_eq!(repo.find_user_by_id(user.id).unwrap().unwrap().username, "alice");
        assert!(repo.find_user_by_username("ALICE").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_is_not_inserted() {
        let repo = repo();
        assert!(repo.insert_user(&User::new("alice", "h1")).unwrap());
        assert!(!repo.insert_user(&User::new("alice", "h2")).unwrap());

        let stored = repo.find_user_by_username("alice").unwrap().unwrap();
        assert_eq!(stored.password_hash, "h1");
    }

    #[test]
    fn test_commit_updates_balance_and_appends() {
        let repo = repo();
        let user = User::new("alice", "hash");
        repo.insert_user(&user).unwrap();

        let outcome = repo.commit_ledger(&credit(&user, Decimal::new(1050, 2))).unwrap();
        assert_eq!(outcome, CommitOutcome::Committed);

        let stored = repo.find_user_by_id(user.id).unwrap().unwrap();
        assert_eq!(stored.balance, Decimal::new(1050, 2));
        assert_eq!(stored.version, 1);

        let history = repo.transactions_for_user(user.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount, Decimal::new(1050, 2));
        assert_eq!(history[0].sequence, 1);
    }

    #[test]
    fn test_stale_version_rolls_back_everything() {
        let repo = repo();
        let alice = User::new("alice", "hash");
        let bob = User::new("bob", "hash");
        repo.insert_user(&alice).unwrap();
        repo.insert_user(&bob).unwrap();

        // First update is valid, second carries a stale version
        let mut commit = credit(&alice, Decimal::TEN);
        let mut stale_bob = bob.clone();
        stale_bob.version = 7;
        let bob_part = credit(&stale_bob, Decimal::TEN);
        commit.updates.extend(bob_part.updates);
        commit.entries.extend(bob_part.entries);

        let outcome = repo.commit_ledger(&commit).unwrap();
        assert_eq!(outcome, CommitOutcome::VersionConflict);

        let alice_now = repo.find_user_by_id(alice.id).unwrap().unwrap();
        assert_eq!(alice_now.balance, Decimal::ZERO);
        assert_eq!(alice_now.version, 0);
        assert!(repo.transactions_for_user(alice.id).unwrap().is_empty());
    }

    #[test]
    fn test_negative_balance_is_refused_by_storage() {
        let repo = repo();
        let user = User::new("alice", "hash");
        repo.insert_user(&user).unwrap();

        let mut commit = credit(&user, Decimal::ONE);
        commit.updates[0].new_balance = Decimal::NEGATIVE_ONE;
        commit.entries.clear();
        assert!(repo.commit_ledger(&commit).is_err());

        let stored = repo.find_user_by_id(user.id).unwrap().unwrap();
        assert_eq!(stored.version, 0);
    }

    #[test]
    fn test_products_and_totals() {
        let repo = repo();
        let product = Product::new("Book", Decimal::new(49999, 2), None);
        repo.insert_product(&product).unwrap();

        let listed = repo.list_products().unwrap();
        assert_eq!(listed, vec![product.clone()]);
        assert_eq!(repo.find_product(product.id).unwrap(), Some(product));
        assert!(repo.find_product(Uuid::new_v4()).unwrap().is_none());

        let user = User::new("alice", "hash");
        repo.insert_user(&user).unwrap();
        repo.commit_ledger(&credit(&user, Decimal::new(2500, 2))).unwrap();

        let totals = repo.ledger_totals().unwrap();
        assert_eq!(totals.users, 1);
        assert_eq!(totals.transactions, 1);
        assert_eq!(totals.products, 1);
        assert_eq!(totals.funds_held, Decimal::new(2500, 2));
    }
}
