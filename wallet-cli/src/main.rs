//! Wallet CLI - a ledger-backed digital wallet in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod commands;
mod output;
mod server;

use commands::{
    audit, balance, buy, config, fund, logs, pay, product, register, serve, statement, status,
    CredentialArgs,
};

/// Wallet - a ledger-backed digital wallet
#[derive(Parser)]
#[command(name = "wallet", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    creds: CredentialArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new user
    Register {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add money to your wallet
    Fund {
        /// Amount in the base currency
        amount: Decimal,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Pay another user
    Pay {
        /// Recipient username
        to: String,
        /// Amount in the base currency
        amount: Decimal,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show your balance
    Balance {
        /// Convert to this currency (ISO 4217 code)
        #[arg(long, short)]
        currency: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List your transactions, most recent first
    Statement {
        /// Show at most N entries
        #[arg(long, short = 'n')]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the product catalog
    Product {
        #[command(subcommand)]
        command: product::ProductCommands,
    },

    /// Buy a product
    Buy {
        /// Product ID
        product_id: Uuid,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check your transaction log against your balance
    Audit {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show wallet-wide totals
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },

    /// Run the HTTP API
    Serve {
        /// Address to listen on (default from settings, then 127.0.0.1:5000)
        #[arg(long)]
        bind: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    init_tracing(default_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the default level
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let creds = &cli.creds;
    match cli.command {
        Commands::Register { json } => register::run(creds, json),
        Commands::Fund { amount, json } => fund::run(creds, amount, json),
        Commands::Pay { to, amount, json } => pay::run(creds, &to, amount, json),
        Commands::Balance { currency, json } => balance::run(creds, currency.as_deref(), json),
        Commands::Statement { limit, json } => statement::run(creds, limit, json),
        Commands::Product { command } => product::run(creds, command),
        Commands::Buy { product_id, json } => buy::run(creds, product_id, json),
        Commands::Audit { json } => audit::run(creds, json),
        Commands::Status { json } => status::run(json),
        Commands::Logs { command } => logs::run(command),
        Commands::Config { command } => config::run(command),
        Commands::Serve { bind } => serve::run(bind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_pay_with_credentials() {
        let cli = Cli::try_parse_from([
            "wallet", "pay", "bob", "12.50", "--username", "alice", "--password", "pw",
        ])
        .unwrap();
        assert_eq!(cli.creds.username.as_deref(), Some("alice"));
        match cli.command {
            Commands::Pay { to, amount, .. } => {
                assert_eq!(to, "bob");
                assert_eq!(amount, Decimal::new(1250, 2));
            }
            _ => panic!("expected pay"),
        }
    }

    #[test]
    fn test_parse_config_set() {
        let cli =
            Cli::try_parse_from(["wallet", "config", "set", "currency.offlineRates.USD", "0.012"])
                .unwrap();
        match cli.command {
            Commands::Config {
                command: config::ConfigCommands::Set { key, value },
            } => {
                assert_eq!(key, "currency.offlineRates.USD");
                assert_eq!(value, "0.012");
            }
            _ => panic!("expected config set"),
        }
    }

    #[test]
    fn test_rejects_non_numeric_amount() {
        assert!(Cli::try_parse_from(["wallet", "fund", "ten"]).is_err());
    }
}
