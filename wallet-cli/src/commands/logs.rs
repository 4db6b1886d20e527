//! Logs command - inspect the wallet's event log
//!
//! The event log never holds usernames or amounts, so everything here is
//! safe to paste into a bug report.

use anyhow::Result;
use chrono::{Duration, TimeZone, Utc};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use serde_json::json;

use super::get_wallet_dir;
use crate::output;
use wallet_core::services::{EntryPoint, LogEntry, LoggingService};
use wallet_core::APP_VERSION;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent events
    List {
        /// Number of events to show
        #[arg(short = 'n', long, default_value_t = 50)]
        limit: usize,
        /// Only failed operations
        #[arg(long)]
        errors: bool,
        /// Only events for one command (e.g. pay) or route (e.g. /pay)
        #[arg(long)]
        op: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete old events
    Clear {
        /// Keep the last N days
        #[arg(long, default_value_t = 30)]
        older_than_days: u32,
        /// Do not ask for confirmation
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Event counts, failures by kind, and where the log lives
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: LogsCommands) -> Result<()> {
    let wallet_dir = get_wallet_dir()?;
    std::fs::create_dir_all(&wallet_dir)?;
    let log = LoggingService::new(&wallet_dir, EntryPoint::Cli, APP_VERSION)?;

    match command {
        LogsCommands::List {
            limit,
            errors,
            op,
            json,
        } => list(&log, limit, errors, op.as_deref(), json),
        LogsCommands::Clear {
            older_than_days,
            force,
            json,
        } => clear(&log, older_than_days, force, json),
        LogsCommands::Stats { json } => stats(&log, json),
    }
}

fn list(log: &LoggingService, limit: usize, errors: bool, op: Option<&str>, json: bool) -> Result<()> {
    let entries = match op {
        Some(op) => log.get_for_operation(op.trim(), errors, limit)?,
        None if errors => log.get_errors(limit)?,
        None => log.get_recent(limit)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No events recorded.");
        return Ok(());
    }

    let mut table = output::table(&["Time", "Via", "Event", "Operation", "Failure"]);
    for entry in &entries {
        table.add_row(vec![
            utc_time(entry.timestamp),
            entry.entry_point.clone(),
            entry.event.clone(),
            operation(entry).to_string(),
            entry
                .error_kind
                .as_deref()
                .map(|kind| kind.red().to_string())
                .unwrap_or_default(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn clear(log: &LoggingService, older_than_days: u32, force: bool, json: bool) -> Result<()> {
    let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete events older than {} days?", older_than_days))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Nothing deleted.");
            return Ok(());
        }
    }

    let deleted = log.delete_before(cutoff.timestamp_millis())?;
    if json {
        println!("{}", json!({ "deleted": deleted }));
    } else {
        output::success(&format!("Deleted {} events", deleted));
    }
    Ok(())
}

fn stats(log: &LoggingService, json: bool) -> Result<()> {
    let total = log.count()?;
    let kinds = log.error_kinds()?;
    let failures: u64 = kinds.iter().map(|(_, n)| n).sum();
    let path = log.db_path();
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    if json {
        let by_kind: serde_json::Map<_, _> = kinds
            .iter()
            .map(|(kind, n)| (kind.clone(), json!(n)))
            .collect();
        let value = json!({
            "total_events": total,
            "failures": failures,
            "failures_by_kind": by_kind,
            "database_path": path.to_string_lossy(),
            "database_size_bytes": size,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "Event log".bold());
    println!("  Events:   {}", total);
    println!("  Failures: {}", failures);
    for (kind, n) in &kinds {
        println!("    {:<22} {}", kind, n);
    }
    println!("  File:     {} ({})", path.display(), output::format_size(size));
    Ok(())
}

/// Command name for CLI events, route for API events
fn operation(entry: &LogEntry) -> &str {
    entry
        .command
        .as_deref()
        .or(entry.route.as_deref())
        .unwrap_or("-")
}

fn utc_time(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}
