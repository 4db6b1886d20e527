//! Terminal rendering shared by the commands

use colored::{ColoredString, Colorize};
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use rust_decimal::{Decimal, RoundingStrategy};
use wallet_core::TransactionKind;

pub fn success(msg: &str) {
    println!("{}", msg.green());
}

pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// A condensed table with the given header row
pub fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

/// An amount in minor units with its currency code, e.g. `120.50 INR`
pub fn money(amount: Decimal, currency: &str) -> String {
    format!("{} {}", minor_units(amount), currency)
}

fn minor_units(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

/// A ledger amount signed and colored by direction
pub fn signed(kind: TransactionKind, amount: Decimal) -> ColoredString {
    match kind {
        TransactionKind::Credit => format!("+{}", minor_units(amount)).green(),
        TransactionKind::Debit => format!("-{}", minor_units(amount)).red(),
    }
}

/// Byte count in the largest binary unit that keeps it at least 1
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    let mut value = bytes as f64;
    let mut unit = None;
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = Some(next);
    }
    match unit {
        Some(unit) => format!("{:.1} {}", value, unit),
        None => format!("{} bytes", bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_always_shows_minor_units() {
        assert_eq!(money(Decimal::new(120, 0), "INR"), "120.00 INR");
        assert_eq!(money(Decimal::new(1805, 3), "USD"), "1.81 USD");
    }

    #[test]
    fn test_signed_amounts() {
        colored::control::set_override(false);
        assert_eq!(signed(TransactionKind::Credit, Decimal::new(5, 0)).to_string(), "+5.00");
        assert_eq!(signed(TransactionKind::Debit, Decimal::new(305, 1)).to_string(), "-30.50");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}
