//! Static exchange rate table
//!
//! Used when no currency API is configured, in offline mode, and in tests.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::domain::result::{Result, WalletError};
use crate::ports::RateProvider;

#[derive(Debug, Clone, Default)]
pub struct FixedRates {
    rates: HashMap<String, Decimal>,
}

impl FixedRates {
    pub fn new(rates: HashMap<String, Decimal>) -> Self {
        Self {
            rates: rates
                .into_iter()
                .map(|(code, rate)| (code.trim().to_ascii_uppercase(), rate))
                .collect(),
        }
    }

    /// A provider that knows no rates; every lookup is unavailable
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, code: &str, rate: Decimal) -> Self {
        self.rates.insert(code.trim().to_ascii_uppercase(), rate);
        self
    }
}

impl RateProvider for FixedRates {
    fn name(&self) -> &str {
        "fixed"
    }

    fn rate(&self, code: &str) -> Result<Decimal> {
        self.rates
            .get(code)
            .copied()
            .filter(|rate| *rate > Decimal::ZERO)
            .ok_or_else(|| WalletError::unavailable(format!("No rate for currency {}", code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let rates = FixedRates::default().with_rate("usd", Decimal::new(12, 3));
        assert_eq!(rates.rate("USD").unwrap(), Decimal::new(12, 3));
        assert!(matches!(
            rates.rate("EUR"),
            Err(WalletError::ServiceUnavailable(_))
        ));
        assert!(FixedRates::unavailable().rate("USD").is_err());
    }
}
