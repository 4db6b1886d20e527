//! Audit command - replay your transaction log against your balance

use anyhow::Result;
use colored::Colorize;

use super::{get_context, login, CredentialArgs};
use crate::output;

pub fn run(creds: &CredentialArgs, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let caller = login(&ctx, creds)?;

    let audit = ctx.wallet.audit(&caller)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&audit)?);
        if !audit.consistent {
            std::process::exit(1);
        }
        return Ok(());
    }

    let currency = ctx.wallet.base_currency();
    let mut table = output::table(&["Entries", "Stored balance", "Replayed balance"]);
    table.add_row(vec![
        audit.entries.to_string(),
        output::money(audit.stored_balance, currency),
        output::money(audit.replayed_balance, currency),
    ]);
    println!("{}", table);

    if audit.consistent {
        println!("{} Transaction log matches balance", "✓".green());
        return Ok(());
    }

    println!("{} Transaction log does not match balance", "✗".red());
    if let Some(sequence) = audit.first_mismatch {
        println!("  First mismatch at entry #{}", sequence);
    }
    std::process::exit(1);
}
