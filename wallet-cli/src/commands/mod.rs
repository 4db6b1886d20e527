//! CLI command implementations

pub mod audit;
pub mod balance;
pub mod buy;
pub mod config;
pub mod fund;
pub mod logs;
pub mod pay;
pub mod product;
pub mod register;
pub mod serve;
pub mod statement;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use dialoguer::{Input, Password};

use wallet_core::{BasicCredentials, Caller, EntryPoint, WalletContext};

/// Credentials for commands that act on a user's wallet
#[derive(Args, Clone, Debug, Default)]
pub struct CredentialArgs {
    /// Username (prompted when missing)
    #[arg(long, short = 'u', env = "WALLET_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password (prompted when missing)
    #[arg(long, env = "WALLET_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,
}

impl CredentialArgs {
    /// Fill in anything missing from interactive prompts
    pub fn resolve(&self) -> Result<BasicCredentials> {
        let username = match &self.username {
            Some(name) => name.clone(),
            None => Input::new().with_prompt("Username").interact_text()?,
        };
        let password = match &self.password {
            Some(password) => password.clone(),
            None => Password::new().with_prompt("Password").interact()?,
        };
        Ok(BasicCredentials::new(username, password))
    }
}

/// Get the wallet directory from environment or default
pub fn get_wallet_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("WALLET_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".wallet"))
}

/// Open the wallet for a CLI command
pub fn get_context() -> Result<WalletContext> {
    open_context(EntryPoint::Cli)
}

pub fn open_context(entry_point: EntryPoint) -> Result<WalletContext> {
    let wallet_dir = get_wallet_dir()?;
    WalletContext::new(&wallet_dir, entry_point)
        .with_context(|| format!("Failed to open wallet in {}", wallet_dir.display()))
}

/// Authenticate through the same gate as the HTTP API
pub fn login(ctx: &WalletContext, creds: &CredentialArgs) -> Result<Caller> {
    let header = creds.resolve()?.to_header();
    Ok(ctx.wallet.authenticate(Some(&header))?)
}
