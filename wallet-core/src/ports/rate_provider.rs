//! Exchange rate provider port
//!
//! The wallet stores every balance in a single base currency. A rate
//! provider answers "how many units of `code` is one base unit worth".
//! Providers are black boxes: they either return a positive rate or fail
//! with `WalletError::ServiceUnavailable`.

use rust_decimal::Decimal;

use crate::domain::result::Result;

pub trait RateProvider: Send + Sync {
    /// Provider name (e.g., "currencyapi", "fixed")
    fn name(&self) -> &str;

    /// Rate from the base currency to `code` (already upper-cased)
    fn rate(&self, code: &str) -> Result<Decimal>;
}
