//! Pay command - transfer money to another user

use anyhow::Result;
use rust_decimal::Decimal;
use serde_json::json;

use super::{get_context, login, CredentialArgs};
use crate::output;

pub fn run(creds: &CredentialArgs, to: &str, amount: Decimal, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let caller = login(&ctx, creds)?;

    let balance = ctx.wallet.pay(&caller, to, amount)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&json!({ "balance": balance }))?);
    } else {
        let currency = ctx.wallet.base_currency();
        output::success(&format!("Paid {} to {}", output::money(amount, currency), to.trim()));
        println!("Balance: {}", output::money(balance, currency));
    }
    Ok(())
}
