//! Status command - show wallet-wide totals

use anyhow::Result;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use super::get_context;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let status = ctx.status_service.get_status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Wallet Status".bold());
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec!["Users", &status.total_users.to_string()]);
    table.add_row(vec!["Transactions", &status.total_transactions.to_string()]);
    table.add_row(vec!["Products", &status.total_products.to_string()]);
    table.add_row(vec![
        "Funds held",
        &format!("{} {}", status.funds_held, status.base_currency),
    ]);

    println!("{}", table);
    println!();
    println!("Exchange rates: {}", ctx.wallet.rate_provider());
    if let Some(path) = ctx.repository.db_path() {
        println!("Database: {}", path.display());
    }

    Ok(())
}
