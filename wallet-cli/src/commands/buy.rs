//! Buy command - purchase a catalog product

use anyhow::Result;
use serde_json::json;
use uuid::Uuid;

use super::{get_context, login, CredentialArgs};
use crate::output;

pub fn run(creds: &CredentialArgs, product_id: Uuid, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let caller = login(&ctx, creds)?;

    let balance = ctx.wallet.buy(&caller, product_id)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "message": "Product purchased",
                "balance": balance,
            }))?
        );
    } else {
        output::success("Product purchased");
        println!("Balance: {}", output::money(balance, ctx.wallet.base_currency()));
    }
    Ok(())
}
