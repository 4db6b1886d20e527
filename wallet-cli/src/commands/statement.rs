//! Statement command - list your transactions, most recent first

use anyhow::Result;

use super::{get_context, login, CredentialArgs};
use crate::output;

pub fn run(creds: &CredentialArgs, limit: Option<usize>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let caller = login(&ctx, creds)?;

    let mut history = ctx.wallet.history(&caller)?;
    if let Some(limit) = limit {
        history.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("No transactions yet.");
        return Ok(());
    }

    let mut table = output::table(&["#", "Time", "Kind", "Source", "Amount", "Balance"]);

    for entry in &history {
        table.add_row(vec![
            entry.sequence.to_string(),
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            entry.kind.to_string(),
            entry.source.as_str().to_string(),
            output::signed(entry.kind, entry.amount).to_string(),
            output::money(entry.resulting_balance, ctx.wallet.base_currency()),
        ]);
    }

    println!("{}", table);
    Ok(())
}
