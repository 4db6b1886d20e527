//! Status service - store-wide summary

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::Result;
use crate::ports::Repository;

pub struct StatusService {
    repository: Arc<dyn Repository>,
    base_currency: String,
}

impl StatusService {
    pub fn new(repository: Arc<dyn Repository>, base_currency: impl Into<String>) -> Self {
        Self {
            repository,
            base_currency: base_currency.into(),
        }
    }

    pub fn get_status(&self) -> Result<StatusSummary> {
        let totals = self.repository.ledger_totals()?;
        Ok(StatusSummary {
            total_users: totals.users,
            total_transactions: totals.transactions,
            total_products: totals.products,
            funds_held: totals.funds_held,
            base_currency: self.base_currency.clone(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub total_users: i64,
    pub total_transactions: i64,
    pub total_products: i64,
    pub funds_held: Decimal,
    pub base_currency: String,
}
