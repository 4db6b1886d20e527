//! Account ledger - balances and the transaction log
//!
//! Every mutation follows the same shape:
//!
//! 1. validate inputs (nothing is written on failure)
//! 2. claim the affected users in [`UserLocks`]
//! 3. re-read their balances and versions under the claim
//! 4. build one [`LedgerCommit`] with CAS balance updates and the entries
//! 5. commit it atomically through the repository
//!
//! The claim serializes writers inside this process. The version check in
//! storage catches writers outside it (another CLI process on the same
//! database file); those surface as `Conflict` and are not retried.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::domain;
use crate::domain::money::{max_balance, validate_amount};
use crate::domain::result::{Result, WalletError};
use crate::domain::{Transaction, TransactionKind, TransactionSource, User};
use crate::ports::{BalanceUpdate, CommitOutcome, LedgerCommit, Repository};

use super::locks::UserLocks;

/// Result of replaying a user's transaction log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryAudit {
    pub entries: usize,
    pub stored_balance: Decimal,
    pub replayed_balance: Decimal,
    /// Sequence of the first entry whose recorded balance disagrees with replay
    pub first_mismatch: Option<i64>,
    pub consistent: bool,
}

pub struct LedgerService {
    repository: Arc<dyn Repository>,
    locks: UserLocks,
}

impl LedgerService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self {
            repository,
            locks: UserLocks::new(),
        }
    }

    /// Credit `amount` to a user, returning the new balance
    pub fn fund(&self, user_id: Uuid, amount: Decimal) -> Result<Decimal> {
        let amount = validate_amount(amount, "Amount")?;

        let _claim = self.locks.lock(user_id);
        let user = self.load_user(user_id)?;

        let new_balance = ensure_capacity(&user, amount)?;
        let at = entry_time(&[&user]);
        let entry = Transaction::new(
            user.id,
            TransactionKind::Credit,
            TransactionSource::Funding,
            amount,
            new_balance,
            user.version + 1,
            at,
        );

        self.commit(LedgerCommit {
            updates: vec![balance_update(&user, new_balance, at)],
            entries: vec![entry],
        })?;

        debug!(user_id = %user_id, "funded account");
        Ok(new_balance)
    }

    /// Move `amount` from the sender to the named recipient
    ///
    /// Returns the sender's new balance. Writes a debit on the sender and a
    /// credit on the recipient in the same commit, or nothing at all.
    pub fn transfer(
        &self,
        sender_id: Uuid,
        recipient_username: &str,
        amount: Decimal,
    ) -> Result<Decimal> {
        let amount = validate_amount(amount, "Amount")?;

        let recipient_username = recipient_username.trim();
        if recipient_username.is_empty() {
            return Err(WalletError::invalid("Recipient is required"));
        }
        let recipient = self
            .repository
            .find_user_by_username(recipient_username)?
            .ok_or_else(|| WalletError::RecipientNotFound(recipient_username.to_string()))?;

        if recipient.id == sender_id {
            return Err(WalletError::invalid("Cannot transfer to yourself"));
        }

        let _claim = self.locks.lock_many(&[sender_id, recipient.id]);
        let sender = self.load_user(sender_id)?;
        let recipient = self.load_user(recipient.id)?;

        ensure_funds(&sender, amount)?;

        let sender_balance = sender.balance - amount;
        let recipient_balance = ensure_capacity(&recipient, amount)?;
        let at = entry_time(&[&sender, &recipient]);

        let debit = Transaction::new(
            sender.id,
            TransactionKind::Debit,
            TransactionSource::Transfer,
            amount,
            sender_balance,
            sender.version + 1,
            at,
        )
        .with_counterparty(recipient.id);
        let credit = Transaction::new(
            recipient.id,
            TransactionKind::Credit,
            TransactionSource::Transfer,
            amount,
            recipient_balance,
            recipient.version + 1,
            at,
        )
        .with_counterparty(sender.id);

        self.commit(LedgerCommit {
            updates: vec![
                balance_update(&sender, sender_balance, at),
                balance_update(&recipient, recipient_balance, at),
            ],
            entries: vec![debit, credit],
        })?;

        debug!(sender = %sender.id, recipient = %recipient.id, "transfer committed");
        Ok(sender_balance)
    }

    /// Buy a catalog product at its current price
    pub fn purchase(&self, user_id: Uuid, product_id: Uuid) -> Result<Decimal> {
        let product = self
            .repository
            .find_product(product_id)?
            .ok_or(WalletError::ProductNotFound(product_id))?;

        let _claim = self.locks.lock(user_id);
        let user = self.load_user(user_id)?;

        ensure_funds(&user, product.price)?;

        let new_balance = user.balance - product.price;
        let at = entry_time(&[&user]);
        let entry = Transaction::new(
            user.id,
            TransactionKind::Debit,
            TransactionSource::Purchase,
            product.price,
            new_balance,
            user.version + 1,
            at,
        )
        .with_product(product.id);

        self.commit(LedgerCommit {
            updates: vec![balance_update(&user, new_balance, at)],
            entries: vec![entry],
        })?;

        debug!(user_id = %user_id, product_id = %product_id, "purchase committed");
        Ok(new_balance)
    }

    /// Current base-currency balance
    pub fn balance(&self, user_id: Uuid) -> Result<Decimal> {
        Ok(self.load_user(user_id)?.balance)
    }

    /// Every entry for the user, most recent first
    pub fn history(&self, user_id: Uuid) -> Result<Vec<Transaction>> {
        self.repository.transactions_for_user(user_id)
    }

    /// Replay the log from zero and compare with recorded balances
    pub fn verify_history(&self, user_id: Uuid) -> Result<HistoryAudit> {
        let _claim = self.locks.lock(user_id);
        let user = self.load_user(user_id)?;
        let mut entries = self.repository.transactions_for_user(user_id)?;
        entries.reverse();

        let mut running = Decimal::ZERO;
        let mut last_sequence = 0;
        let mut first_mismatch = None;

        for entry in &entries {
            running = entry.kind.apply(running, entry.amount);
            let out_of_order = entry.sequence <= last_sequence;
            if first_mismatch.is_none()
                && (running != entry.resulting_balance || running < Decimal::ZERO || out_of_order)
            {
                first_mismatch = Some(entry.sequence);
            }
            last_sequence = entry.sequence;
        }

        let consistent = first_mismatch.is_none() && running == user.balance;
        Ok(HistoryAudit {
            entries: entries.len(),
            stored_balance: user.balance,
            replayed_balance: running,
            first_mismatch,
            consistent,
        })
    }

    fn load_user(&self, user_id: Uuid) -> Result<User> {
        self.repository
            .find_user_by_id(user_id)?
            .ok_or(WalletError::AuthenticationRequired)
    }

    fn commit(&self, commit: LedgerCommit) -> Result<()> {
        match self.repository.commit_ledger(&commit)? {
            CommitOutcome::Committed => Ok(()),
            CommitOutcome::VersionConflict => Err(WalletError::conflict(
                "Balance changed concurrently; please retry",
            )),
        }
    }
}

fn ensure_funds(user: &User, amount: Decimal) -> Result<()> {
    if user.balance < amount {
        return Err(WalletError::InsufficientFunds {
            available: user.balance,
            requested: amount,
        });
    }
    Ok(())
}

/// The balance after crediting `amount`, if the account can hold it
fn ensure_capacity(user: &User, amount: Decimal) -> Result<Decimal> {
    let new_balance = user.balance + amount;
    if new_balance > max_balance() {
        return Err(WalletError::invalid(
            "Amount would exceed the maximum wallet balance",
        ));
    }
    Ok(new_balance)
}

fn balance_update(user: &User, new_balance: Decimal, at: DateTime<Utc>) -> BalanceUpdate {
    BalanceUpdate {
        user_id: user.id,
        expected_version: user.version,
        new_balance,
        updated_at: at,
    }
}

/// Wall-clock time, but never earlier than any participant's last update
fn entry_time(users: &[&User]) -> DateTime<Utc> {
    users
        .iter()
        .map(|u| u.updated_at)
        .fold(domain::now(), |acc, t| acc.max(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::duckdb::DuckDbRepository;
    use crate::domain::money::max_amount;
    use crate::domain::Product;

    struct Fixture {
        repo: Arc<DuckDbRepository>,
        ledger: LedgerService,
    }

    fn fixture() -> Fixture {
        let repo = DuckDbRepository::in_memory().unwrap();
        repo.ensure_schema().unwrap();
        let repo = Arc::new(repo);
        let ledger = LedgerService::new(repo.clone());
        Fixture { repo, ledger }
    }

    fn user(f: &Fixture, name: &str) -> Uuid {
        let u = User::new(name, "hash");
        assert!(f.repo.insert_user(&u).unwrap());
        u.id
    }

    fn dec(units: i64) -> Decimal {
        Decimal::new(units, 0)
    }

    #[test]
    fn test_fund_appends_credit() {
        let f = fixture();
        let a = user(&f, "a");

        assert_eq!(f.ledger.fund(a, dec(100)).unwrap(), dec(100));
        assert_eq!(f.ledger.fund(a, Decimal::new(5025, 2)).unwrap(), Decimal::new(15025, 2));

        let history = f.ledger.history(a).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].sequence, 2);
        assert_eq!(history[0].resulting_balance, Decimal::new(15025, 2));
        assert!(history.iter().all(|t| t.kind == TransactionKind::Credit));
    }

    #[test]
    fn test_fund_rejects_bad_amounts_without_writing() {
        let f = fixture();
        let a = user(&f, "a");

        for bad in [Decimal::ZERO, dec(-5), Decimal::new(1001, 3)] {
            let err = f.ledger.fund(a, bad).unwrap_err();
            assert!(matches!(err, WalletError::InvalidInput(_)));
        }
        assert!(f.ledger.history(a).unwrap().is_empty());
        assert_eq!(f.ledger.balance(a).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_fund_rejects_balance_beyond_capacity() {
        let f = fixture();
        let a = user(&f, "a");
        let chunk = max_amount();

        for _ in 0..9 {
            f.ledger.fund(a, chunk).unwrap();
        }
        let before = f.ledger.balance(a).unwrap();
        assert_eq!(before, chunk * dec(9));

        let err = f.ledger.fund(a, chunk).unwrap_err();
        assert!(matches!(err, WalletError::InvalidInput(msg) if msg.contains("maximum")));
        assert_eq!(f.ledger.balance(a).unwrap(), before);
        assert_eq!(f.ledger.history(a).unwrap().len(), 9);

        // topping up to the exact ceiling is still accepted
        let room = max_balance() - before;
        assert_eq!(f.ledger.fund(a, room).unwrap(), max_balance());
    }

    #[test]
    fn test_transfer_rejects_recipient_beyond_capacity() {
        let f = fixture();
        let a = user(&f, "a");
        let b = user(&f, "b");
        f.ledger.fund(a, dec(10)).unwrap();
        for _ in 0..9 {
            f.ledger.fund(b, max_amount()).unwrap();
        }
        f.ledger.fund(b, max_balance() - f.ledger.balance(b).unwrap()).unwrap();

        let err = f.ledger.transfer(a, "b", dec(1)).unwrap_err();
        assert!(matches!(err, WalletError::InvalidInput(_)));
        assert_eq!(f.ledger.balance(a).unwrap(), dec(10));
        assert_eq!(f.ledger.history(a).unwrap().len(), 1);
        assert_eq!(f.ledger.balance(b).unwrap(), max_balance());
    }

    #[test]
    fn test_transfer_writes_both_sides() {
        let f = fixture();
        let a = user(&f, "a");
        let b = user(&f, "b");
        f.ledger.fund(a, dec(150)).unwrap();

        assert_eq!(f.ledger.transfer(a, "b", dec(30)).unwrap(), dec(120));
        assert_eq!(f.ledger.balance(b).unwrap(), dec(30));

        let debit = &f.ledger.history(a).unwrap()[0];
        assert_eq!(debit.kind, TransactionKind::Debit);
        assert_eq!(debit.source, TransactionSource::Transfer);
        assert_eq!(debit.counterparty, Some(b));

        let credit = &f.ledger.history(b).unwrap()[0];
        assert_eq!(credit.kind, TransactionKind::Credit);
        assert_eq!(credit.counterparty, Some(a));
        assert_eq!(credit.resulting_balance, dec(30));
        assert_eq!(debit.timestamp, credit.timestamp);
    }

    #[test]
    fn test_transfer_validation_order() {
        let f = fixture();
        let a = user(&f, "a");
        f.ledger.fund(a, dec(10)).unwrap();

        // bad amount wins over unknown recipient
        let err = f.ledger.transfer(a, "ghost", Decimal::ZERO).unwrap_err();
        assert!(matches!(err, WalletError::InvalidInput(_)));

        let err = f.ledger.transfer(a, "ghost", dec(1)).unwrap_err();
        assert_eq!(err, WalletError::RecipientNotFound("ghost".into()));

        let err = f.ledger.transfer(a, "a", dec(1)).unwrap_err();
        assert!(matches!(err, WalletError::InvalidInput(_)));

        user(&f, "b");
        let err = f.ledger.transfer(a, "b", dec(11)).unwrap_err();
        assert_eq!(
            err,
            WalletError::InsufficientFunds {
                available: dec(10),
                requested: dec(11)
            }
        );

        // nothing but the original credit was written
        assert_eq!(f.ledger.history(a).unwrap().len(), 1);
    }

    #[test]
    fn test_purchase() {
        let f = fixture();
        let a = user(&f, "a");
        let product = Product::new("Lamp", dec(120), None);
        f.repo.insert_product(&product).unwrap();

        let err = f.ledger.purchase(a, product.id).unwrap_err();
        assert!(matches!(err, WalletError::InsufficientFunds { .. }));

        f.ledger.fund(a, dec(120)).unwrap();
        assert_eq!(f.ledger.purchase(a, product.id).unwrap(), Decimal::ZERO);

        let entry = &f.ledger.history(a).unwrap()[0];
        assert_eq!(entry.source, TransactionSource::Purchase);
        assert_eq!(entry.product_id, Some(product.id));

        let missing = Uuid::new_v4();
        assert_eq!(
            f.ledger.purchase(a, missing).unwrap_err(),
            WalletError::ProductNotFound(missing)
        );
    }

    #[test]
    fn test_replay_reproduces_balances() {
        let f = fixture();
        let a = user(&f, "a");
        let b = user(&f, "b");
        f.ledger.fund(a, dec(100)).unwrap();
        f.ledger.fund(b, dec(5)).unwrap();
        f.ledger.transfer(a, "b", Decimal::new(3333, 2)).unwrap();
        f.ledger.transfer(b, "a", dec(1)).unwrap();

        for id in [a, b] {
            let audit = f.ledger.verify_history(id).unwrap();
            assert!(audit.consistent, "{:?}", audit);
            assert_eq!(audit.replayed_balance, audit.stored_balance);
        }
    }

    #[test]
    fn test_timestamps_never_go_backwards() {
        let f = fixture();
        let a = user(&f, "a");
        for _ in 0..5 {
            f.ledger.fund(a, dec(1)).unwrap();
        }
        let history = f.ledger.history(a).unwrap();
        for pair in history.windows(2) {
            assert!(pair[0].sequence > pair[1].sequence);
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
    }
}
