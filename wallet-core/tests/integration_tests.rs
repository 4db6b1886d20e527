//! Integration tests for wallet-core services
//!
//! These tests drive `WalletService` end to end against a real DuckDB file.
//! Currency rates come from a static table so no network IO happens.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::sync::Arc;
use tempfile::TempDir;

use rust_decimal::Decimal;
use uuid::Uuid;

use wallet_core::adapters::duckdb::DuckDbRepository;
use wallet_core::adapters::fixed_rates::FixedRates;
use wallet_core::ports::Repository;
use wallet_core::services::{CredentialService, EntryPoint, LoggingService, StatusService};
use wallet_core::{
    BasicCredentials, Caller, NewProduct, TransactionKind, TransactionSource, WalletError,
    WalletService,
};

// ============================================================================
// Test Helpers
// ============================================================================

/// Create a test repository with schema initialized
fn create_test_repo(temp_dir: &TempDir) -> Arc<DuckDbRepository> {
    let db_path = temp_dir.path().join("wallet.duckdb");
    let repo = DuckDbRepository::new(&db_path).expect("Failed to create repository");
    repo.ensure_schema().expect("Failed to initialize schema");
    Arc::new(repo)
}

fn create_wallet(repo: &Arc<DuckDbRepository>, rates: FixedRates) -> WalletService {
    let store: Arc<dyn Repository> = repo.clone();
    let creds = CredentialService::with_params(Arc::clone(&store), CredentialService::fast_params());
    WalletService::new(store, creds, Arc::new(rates), "INR")
}

fn register_and_login(wallet: &WalletService, username: &str) -> Caller {
    wallet.register(username, "secret").unwrap();
    let header = BasicCredentials::new(username, "secret").to_header();
    wallet.authenticate(Some(&header)).unwrap()
}

fn dec(units: i64) -> Decimal {
    Decimal::new(units, 0)
}

// ============================================================================
// End-to-end ledger scenario
// ============================================================================

#[test]
fn test_fund_pay_buy_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let wallet = create_wallet(&repo, FixedRates::unavailable());

    let a = register_and_login(&wallet, "alice");
    let b = register_and_login(&wallet, "bob");

    assert_eq!(wallet.fund(&a, dec(100)).unwrap(), dec(100));
    assert_eq!(wallet.fund(&a, dec(50)).unwrap(), dec(150));

    assert_eq!(wallet.pay(&a, "bob", dec(30)).unwrap(), dec(120));
    assert_eq!(wallet.balance(&b, None).unwrap().balance, dec(30));

    let product = wallet
        .add_product(
            &a,
            NewProduct {
                name: "Headphones".to_string(),
                price: dec(120),
                description: None,
            },
        )
        .unwrap();
    assert_eq!(wallet.buy(&a, product.id).unwrap(), Decimal::ZERO);

    let err = wallet.buy(&a, product.id).unwrap_err();
    assert!(matches!(err, WalletError::InsufficientFunds { .. }));
    assert_eq!(wallet.balance(&a, None).unwrap().balance, Decimal::ZERO);

    // Statement is newest first
    let history = wallet.history(&a).unwrap();
    let summary: Vec<_> = history
        .iter()
        .map(|t| (t.kind, t.source, t.resulting_balance))
        .collect();
    assert_eq!(
        summary,
        vec![
            (TransactionKind::Debit, TransactionSource::Purchase, Decimal::ZERO),
            (TransactionKind::Debit, TransactionSource::Transfer, dec(120)),
            (TransactionKind::Credit, TransactionSource::Funding, dec(150)),
            (TransactionKind::Credit, TransactionSource::Funding, dec(100)),
        ]
    );

    let bob_history = wallet.history(&b).unwrap();
    assert_eq!(bob_history.len(), 1);
    assert_eq!(bob_history[0].counterparty, Some(a.user_id()));
    assert_eq!(bob_history[0].resulting_balance, dec(30));

    assert!(wallet.audit(&a).unwrap().consistent);
    assert!(wallet.audit(&b).unwrap().consistent);
}

#[test]
fn test_failed_operations_leave_no_trace() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let wallet = create_wallet(&repo, FixedRates::unavailable());

    let a = register_and_login(&wallet, "alice");
    register_and_login(&wallet, "bob");
    wallet.fund(&a, dec(10)).unwrap();

    assert!(wallet.pay(&a, "bob", dec(11)).is_err());
    assert!(wallet.pay(&a, "nobody", dec(1)).is_err());
    assert!(wallet.pay(&a, "bob", Decimal::new(-1, 0)).is_err());
    assert!(wallet.buy(&a, Uuid::new_v4()).is_err());

    let totals = repo.ledger_totals().unwrap();
    assert_eq!(totals.transactions, 1);
    assert_eq!(totals.funds_held, dec(10));
}

// ============================================================================
// Credentials
// ============================================================================

#[test]
fn test_duplicate_registration_keeps_original_password() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let wallet = create_wallet(&repo, FixedRates::unavailable());

    wallet.register("alice", "first").unwrap();
    let err = wallet.register("alice", "second").unwrap_err();
    assert!(matches!(err, WalletError::DuplicateUser(_)));

    let ok = BasicCredentials::new("alice", "first");
    let stale = BasicCredentials::new("alice", "second");
    assert!(wallet.authenticate_credentials(&ok).is_ok());
    assert_eq!(
        wallet.authenticate_credentials(&stale).unwrap_err(),
        WalletError::AuthenticationRequired
    );
}

#[test]
fn test_auth_failures_are_indistinguishable() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let wallet = create_wallet(&repo, FixedRates::unavailable());
    wallet.register("alice", "secret").unwrap();

    let wrong_password = BasicCredentials::new("alice", "nope").to_header();
    let unknown_user = BasicCredentials::new("mallory", "secret").to_header();

    for header in [None, Some("Bearer abc"), Some(wrong_password.as_str()), Some(unknown_user.as_str())] {
        assert_eq!(
            wallet.authenticate(header).unwrap_err(),
            WalletError::AuthenticationRequired
        );
    }
}

// ============================================================================
// Currency conversion
// ============================================================================

#[test]
fn test_balance_conversion_and_unavailable_rate() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let rates = FixedRates::default().with_rate("USD", Decimal::new(12, 3));
    let wallet = create_wallet(&repo, rates);

    let a = register_and_login(&wallet, "alice");
    wallet.fund(&a, dec(150)).unwrap();

    let usd = wallet.balance(&a, Some("usd")).unwrap();
    assert_eq!(usd.balance, Decimal::new(180, 2));
    assert_eq!(usd.currency, "USD");

    let err = wallet.balance(&a, Some("JPY")).unwrap_err();
    assert!(matches!(err, WalletError::ServiceUnavailable(_)));

    // conversion never touches the stored balance
    assert_eq!(wallet.balance(&a, None).unwrap().balance, dec(150));
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_ledger_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let repo = create_test_repo(&temp_dir);
        let wallet = create_wallet(&repo, FixedRates::unavailable());
        let a = register_and_login(&wallet, "alice");
        wallet.fund(&a, Decimal::new(1050, 2)).unwrap();
    }

    let repo = create_test_repo(&temp_dir);
    let wallet = create_wallet(&repo, FixedRates::unavailable());
    let a = wallet
        .authenticate_credentials(&BasicCredentials::new("alice", "secret"))
        .unwrap();
    assert_eq!(wallet.balance(&a, None).unwrap().balance, Decimal::new(1050, 2));
    assert_eq!(wallet.history(&a).unwrap().len(), 1);

    let status = StatusService::new(repo.clone(), "INR").get_status().unwrap();
    assert_eq!(status.total_users, 1);
    assert_eq!(status.funds_held, Decimal::new(1050, 2));
}

// ============================================================================
// Event log privacy
// ============================================================================

#[test]
fn test_event_log_never_records_names_or_amounts() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let events = Arc::new(LoggingService::new(temp_dir.path(), EntryPoint::Cli, "test").unwrap());
    let wallet = create_wallet(&repo, FixedRates::unavailable()).with_event_log(Arc::clone(&events));

    let a = register_and_login(&wallet, "alice");
    wallet.fund(&a, Decimal::new(4242, 2)).unwrap();
    assert!(wallet.pay(&a, "zebediah", dec(1)).is_err());

    let entries = events.get_recent(100).unwrap();
    assert!(entries.iter().any(|e| e.event == "wallet_funded"));
    assert!(entries
        .iter()
        .any(|e| e.error_kind.as_deref() == Some("recipient_not_found")));

    let dump = serde_json::to_string(&entries).unwrap();
    assert!(!dump.contains("alice"));
    assert!(!dump.contains("zebediah"));
    assert!(!dump.contains("42.42"));
}
