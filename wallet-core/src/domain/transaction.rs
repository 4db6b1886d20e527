//! Transaction domain model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a ledger entry relative to its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "credit",
            TransactionKind::Debit => "debit",
        }
    }

    /// Signed effect of `amount` on the owner's balance
    pub fn apply(&self, balance: Decimal, amount: Decimal) -> Decimal {
        match self {
            TransactionKind::Credit => balance + amount,
            TransactionKind::Debit => balance - amount,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(TransactionKind::Credit),
            "debit" => Ok(TransactionKind::Debit),
            other => Err(format!("unknown transaction kind: {}", other)),
        }
    }
}

/// What caused a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionSource {
    Funding,
    Transfer,
    Purchase,
}

impl TransactionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionSource::Funding => "funding",
            TransactionSource::Transfer => "transfer",
            TransactionSource::Purchase => "purchase",
        }
    }
}

impl FromStr for TransactionSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "funding" => Ok(TransactionSource::Funding),
            "transfer" => Ok(TransactionSource::Transfer),
            "purchase" => Ok(TransactionSource::Purchase),
            other => Err(format!("unknown transaction source: {}", other)),
        }
    }
}

/// An immutable ledger entry belonging to one user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Decimal,
    /// Owner's balance immediately after this entry
    pub resulting_balance: Decimal,
    /// Owner's version after this entry; strictly increasing per user
    pub sequence: i64,
    pub source: TransactionSource,
    /// Other party of a transfer
    pub counterparty: Option<Uuid>,
    /// Product bought, for purchases
    pub product_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        user_id: Uuid,
        kind: TransactionKind,
        source: TransactionSource,
        amount: Decimal,
        resulting_balance: Decimal,
        sequence: i64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            amount,
            resulting_balance,
            sequence,
            source,
            counterparty: None,
            product_id: None,
            timestamp,
        }
    }

    pub fn with_counterparty(mut self, counterparty: Uuid) -> Self {
        self.counterparty = Some(counterparty);
        self
    }

    pub fn with_product(mut self, product_id: Uuid) -> Self {
        self.product_id = Some(product_id);
        self
    }
}
