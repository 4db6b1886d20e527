//! Config command - show and change settings.json

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use wallet_core::config::Config;

use super::get_wallet_dir;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show effective settings (file plus environment overrides)
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change one setting in settings.json
    Set {
        /// Setting path, e.g. server.bind or currency.offlineRates.USD
        key: String,
        value: String,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let wallet_dir = get_wallet_dir()?;

    match command {
        ConfigCommands::Show { json } => {
            let config = Config::load(&wallet_dir)?;
            show(&config, json)
        }
        ConfigCommands::Set { key, value } => {
            std::fs::create_dir_all(&wallet_dir)?;
            let mut config = Config::load_file(&wallet_dir)?;
            config.set(&key, &value)?;
            config.save(&wallet_dir)?;
            println!("{} {} = {}", "Saved".green(), key, value.trim());
            Ok(())
        }
    }
}

fn show(config: &Config, json: bool) -> Result<()> {
    let c = &config.currency;
    let mut rates: Vec<_> = c.offline_rates.iter().collect();
    rates.sort();

    if json {
        let value = serde_json::json!({
            "baseCurrency": c.base_currency,
            "apiUrl": c.api_url,
            "apiKeySet": c.api_key.is_some(),
            "timeoutSecs": c.timeout.as_secs(),
            "cacheTtlSecs": c.cache_ttl.as_secs(),
            "offline": c.offline,
            "offlineRates": c.offline_rates,
            "bind": config.server.bind,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec!["Base currency", c.base_currency.as_str()]);
    table.add_row(vec!["Rates API", c.api_url.as_str()]);
    table.add_row(vec!["API key", if c.api_key.is_some() { "set" } else { "not set" }]);
    table.add_row(vec!["Timeout".to_string(), format!("{}s", c.timeout.as_secs())]);
    table.add_row(vec!["Cache TTL".to_string(), format!("{}s", c.cache_ttl.as_secs())]);
    table.add_row(vec!["Offline", if c.offline { "yes" } else { "no" }]);
    for (code, rate) in rates {
        table.add_row(vec![format!("Rate {}", code), rate.to_string()]);
    }
    table.add_row(vec!["Bind", config.server.bind.as_str()]);

    println!("{}", table);
    Ok(())
}
