use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wallet_core::{BalanceView, NewProduct, Product, Transaction};

// === Requests ===

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterReq {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FundReq {
    pub amt: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PayReq {
    pub to: String,
    pub amt: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddProductReq {
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<AddProductReq> for NewProduct {
    fn from(req: AddProductReq) -> Self {
        NewProduct {
            name: req.name,
            price: req.price,
            description: req.description,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuyReq {
    pub product_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct BalanceQuery {
    pub currency: Option<String>,
}

// === Responses ===

#[derive(Debug, Serialize)]
pub struct MessageDto {
    pub message: String,
}

impl MessageDto {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BalanceDto {
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct BalanceViewDto {
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub currency: String,
}

impl From<BalanceView> for BalanceViewDto {
    fn from(view: BalanceView) -> Self {
        Self {
            balance: view.balance,
            currency: view.currency,
        }
    }
}

/// A transaction as it appears on the statement
#[derive(Debug, Serialize)]
pub struct TransactionDto {
    pub id: Uuid,
    pub kind: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amt: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub updated_bal: Decimal,
    pub source: String,
    pub counterparty: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

impl From<Transaction> for TransactionDto {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id,
            kind: t.kind.as_str().to_string(),
            amt: t.amount,
            updated_bal: t.resulting_balance,
            source: t.source.as_str().to_string(),
            counterparty: t.counterparty,
            product_id: t.product_id,
            timestamp: t.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductDto {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            price: p.price,
            description: p.description,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductCreatedDto {
    pub id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PurchaseDto {
    pub message: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}
