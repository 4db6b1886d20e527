//! Concurrent ledger access tests
//!
//! Many threads drive one `WalletService` against a shared DuckDB file and
//! race on the same balances. Whatever the interleaving, no balance may go
//! negative, money is conserved, and every log replays to its balance.
//!
//! Run with: cargo test --test concurrent_access_test -- --nocapture

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Instant;
use tempfile::TempDir;

use rust_decimal::Decimal;

use wallet_core::adapters::duckdb::DuckDbRepository;
use wallet_core::adapters::fixed_rates::FixedRates;
use wallet_core::ports::Repository;
use wallet_core::services::CredentialService;
use wallet_core::{BasicCredentials, Caller, NewProduct, WalletError, WalletService};

/// Number of concurrent threads for stress tests
const THREAD_COUNT: usize = 8;

/// Number of iterations per thread
const ITERATIONS_PER_THREAD: usize = 5;

fn create_wallet(temp_dir: &TempDir) -> (Arc<DuckDbRepository>, Arc<WalletService>) {
    let repo = DuckDbRepository::new(&temp_dir.path().join("wallet.duckdb")).unwrap();
    repo.ensure_schema().unwrap();
    let repo = Arc::new(repo);
    let store: Arc<dyn Repository> = repo.clone();
    let creds = CredentialService::with_params(Arc::clone(&store), CredentialService::fast_params());
    let wallet = WalletService::new(store, creds, Arc::new(FixedRates::unavailable()), "INR");
    (repo, Arc::new(wallet))
}

fn login(wallet: &WalletService, username: &str) -> Caller {
    wallet.register(username, "pw").unwrap();
    wallet
        .authenticate_credentials(&BasicCredentials::new(username, "pw"))
        .unwrap()
}

/// Test: many threads try to spend the same balance at once.
///
/// Only as many payments as the balance covers may succeed; the rest must
/// fail with InsufficientFunds and leave nothing behind.
#[test]
fn test_concurrent_overdraft_attempts() {
    let temp_dir = TempDir::new().unwrap();
    let (repo, wallet) = create_wallet(&temp_dir);

    let payer = login(&wallet, "payer");
    let payee = login(&wallet, "payee");
    wallet.fund(&payer, Decimal::new(3, 0)).unwrap();

    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let success_count = Arc::new(AtomicUsize::new(0));
    let refused_count = Arc::new(AtomicUsize::new(0));

    let mut handles = vec![];
    for _ in 0..THREAD_COUNT {
        let barrier = Arc::clone(&barrier);
        let wallet = Arc::clone(&wallet);
        let payer = payer.clone();
        let success_count = Arc::clone(&success_count);
        let refused_count = Arc::clone(&refused_count);

        handles.push(thread::spawn(move || {
            barrier.wait();
            match wallet.pay(&payer, "payee", Decimal::ONE) {
                Ok(_) => {
                    success_count.fetch_add(1, Ordering::SeqCst);
                }
                Err(WalletError::InsufficientFunds { .. }) => {
                    refused_count.fetch_add(1, Ordering::SeqCst);
                }
                Err(e) => panic!("unexpected error: {}", e),
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(success_count.load(Ordering::SeqCst), 3);
    assert_eq!(refused_count.load(Ordering::SeqCst), THREAD_COUNT - 3);
    assert_eq!(wallet.balance(&payer, None).unwrap().balance, Decimal::ZERO);
    assert_eq!(wallet.balance(&payee, None).unwrap().balance, Decimal::new(3, 0));

    // 1 funding + 3 debits + 3 credits
    assert_eq!(repo.ledger_totals().unwrap().transactions, 7);
    assert!(wallet.audit(&payer).unwrap().consistent);
    assert!(wallet.audit(&payee).unwrap().consistent);
}

/// Test: pairs of users pay each other in opposite directions at once.
///
/// Opposite-order claims must not deadlock, and the total held must not change.
#[test]
fn test_opposite_transfers_conserve_funds() {
    let temp_dir = TempDir::new().unwrap();
    let (repo, wallet) = create_wallet(&temp_dir);

    let a = login(&wallet, "a");
    let b = login(&wallet, "b");
    wallet.fund(&a, Decimal::new(100, 0)).unwrap();
    wallet.fund(&b, Decimal::new(100, 0)).unwrap();

    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let start = Instant::now();

    let mut handles = vec![];
    for thread_id in 0..THREAD_COUNT {
        let barrier = Arc::clone(&barrier);
        let wallet = Arc::clone(&wallet);
        let (from, to) = if thread_id % 2 == 0 {
            (a.clone(), "b")
        } else {
            (b.clone(), "a")
        };

        handles.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..ITERATIONS_PER_THREAD {
                match wallet.pay(&from, to, Decimal::new(250, 2)) {
                    Ok(_) | Err(WalletError::InsufficientFunds { .. }) => {}
                    Err(e) => panic!("unexpected error: {}", e),
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    println!("Completed opposite transfers in {:?}", start.elapsed());

    let balance_a = wallet.balance(&a, None).unwrap().balance;
    let balance_b = wallet.balance(&b, None).unwrap().balance;
    assert!(balance_a >= Decimal::ZERO);
    assert!(balance_b >= Decimal::ZERO);
    assert_eq!(balance_a + balance_b, Decimal::new(200, 0));
    assert_eq!(repo.ledger_totals().unwrap().funds_held, Decimal::new(200, 0));

    assert!(wallet.audit(&a).unwrap().consistent);
    assert!(wallet.audit(&b).unwrap().consistent);
}

/// Test: concurrent purchases and fundings on one account.
///
/// Every successful operation appears in the log exactly once with a
/// distinct sequence number.
#[test]
fn test_concurrent_fund_and_purchase_sequences() {
    let temp_dir = TempDir::new().unwrap();
    let (_repo, wallet) = create_wallet(&temp_dir);

    let buyer = login(&wallet, "buyer");
    let product = wallet
        .add_product(
            &buyer,
            NewProduct {
                name: "Coffee".to_string(),
                price: Decimal::new(2, 0),
                description: None,
            },
        )
        .unwrap();

    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let success_count = Arc::new(AtomicUsize::new(0));

    let mut handles = vec![];
    for thread_id in 0..THREAD_COUNT {
        let barrier = Arc::clone(&barrier);
        let wallet = Arc::clone(&wallet);
        let buyer = buyer.clone();
        let success_count = Arc::clone(&success_count);
        let product_id = product.id;

        handles.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..ITERATIONS_PER_THREAD {
                let result = if thread_id % 2 == 0 {
                    wallet.fund(&buyer, Decimal::new(2, 0))
                } else {
                    wallet.buy(&buyer, product_id)
                };
                match result {
                    Ok(_) => {
                        success_count.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(WalletError::InsufficientFunds { .. }) => {}
                    Err(e) => panic!("unexpected error: {}", e),
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let history = wallet.history(&buyer).unwrap();
    assert_eq!(history.len(), success_count.load(Ordering::SeqCst));

    let mut sequences: Vec<i64> = history.iter().map(|t| t.sequence).collect();
    sequences.sort_unstable();
    let expected: Vec<i64> = (1..=history.len() as i64).collect();
    assert_eq!(sequences, expected);

    let audit = wallet.audit(&buyer).unwrap();
    assert!(audit.consistent);
    assert!(audit.stored_balance >= Decimal::ZERO);
}
