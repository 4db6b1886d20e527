//! Balance command - show your balance, optionally converted

use anyhow::Result;
use colored::Colorize;

use super::{get_context, login, CredentialArgs};
use crate::output;

pub fn run(creds: &CredentialArgs, currency: Option<&str>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let caller = login(&ctx, creds)?;

    let view = ctx.wallet.balance(&caller, currency)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{}", output::money(view.balance, &view.currency).bold());
    Ok(())
}
