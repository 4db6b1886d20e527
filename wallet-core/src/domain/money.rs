//! Monetary amount validation
//!
//! Amounts are base-currency values with at most two fractional digits.
//! Anything finer is rejected rather than rounded, so every stored balance
//! is exactly the sum of its ledger entries.

use rust_decimal::Decimal;

use super::result::{Result, WalletError};

/// Fractional digits of the base currency's minor unit
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Largest accepted single amount (fits DECIMAL(18,2) with headroom)
pub fn max_amount() -> Decimal {
    Decimal::new(1_000_000_000_000_000, 0)
}

/// Largest balance an account may hold (the DECIMAL(18,2) column limit)
pub fn max_balance() -> Decimal {
    Decimal::new(999_999_999_999_999_999, MINOR_UNIT_SCALE)
}

/// Validate a positive monetary amount, returning it normalized
///
/// `what` names the field in the error message ("Amount", "Price").
pub fn validate_amount(amount: Decimal, what: &str) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(WalletError::invalid(format!(
            "{} must be greater than zero",
            what
        )));
    }
    let normalized = amount.normalize();
    if normalized.scale() > MINOR_UNIT_SCALE {
        return Err(WalletError::invalid(format!(
            "{} must have at most {} decimal places",
            what, MINOR_UNIT_SCALE
        )));
    }
    if normalized > max_amount() {
        return Err(WalletError::invalid(format!("{} is too large", what)));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_accepts_minor_units() {
        assert_eq!(validate_amount(dec("10.50"), "Amount").unwrap(), dec("10.5"));
        assert_eq!(validate_amount(dec("0.01"), "Amount").unwrap(), dec("0.01"));
        assert_eq!(validate_amount(dec("100"), "Amount").unwrap(), dec("100"));
    }

    #[test]
    fn test_trailing_zeros_do_not_count_as_precision() {
        assert!(validate_amount(dec("5.2500"), "Amount").is_ok());
    }

    #[test]
    fn test_rejects_non_positive() {
        let err = validate_amount(Decimal::ZERO, "Amount").unwrap_err();
        assert_eq!(err, WalletError::invalid("Amount must be greater than zero"));
        assert!(validate_amount(dec("-3"), "Price").is_err());
    }

    #[test]
    fn test_rejects_sub_minor_precision() {
        let err = validate_amount(dec("1.005"), "Price").unwrap_err();
        assert!(matches!(err, WalletError::InvalidInput(msg) if msg.contains("decimal places")));
    }

    #[test]
    fn test_max_balance_is_storable() {
        assert_eq!(max_balance(), dec("9999999999999999.99"));
        assert!(max_balance() > max_amount());
    }

    #[test]
    fn test_rejects_oversized() {
        assert!(validate_amount(dec("1000000000000001"), "Amount").is_err());
    }
}
