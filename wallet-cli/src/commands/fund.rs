//! Fund command - add money to your wallet

use anyhow::Result;
use rust_decimal::Decimal;
use serde_json::json;

use super::{get_context, login, CredentialArgs};
use crate::output;

pub fn run(creds: &CredentialArgs, amount: Decimal, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let caller = login(&ctx, creds)?;

    let balance = ctx.wallet.fund(&caller, amount)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&json!({ "balance": balance }))?);
    } else {
        let currency = ctx.wallet.base_currency();
        output::success(&format!("Added {}", output::money(amount, currency)));
        println!("Balance: {}", output::money(balance, currency));
    }
    Ok(())
}
