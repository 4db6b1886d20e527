//! Configuration management
//!
//! Settings live in `settings.json` inside the wallet directory:
//! ```json
//! {
//!   "currency": { "baseCurrency": "INR", "apiKey": "...", "timeoutSecs": 5 },
//!   "server": { "bind": "127.0.0.1:5000" }
//! }
//! ```
//! Every field is optional. Keys this crate does not know about are kept
//! when the file is saved again.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_CURRENCY: &str = "INR";
pub const DEFAULT_RATES_URL: &str = "https://api.currencyapi.com/v3/latest";
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Keys accepted by [`Config::set`]
pub const SETTABLE_KEYS: &[&str] = &[
    "server.bind",
    "currency.apiUrl",
    "currency.timeoutSecs",
    "currency.cacheTtlSecs",
    "currency.offlineRates.<CODE>",
];

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    currency: CurrencySettingsFile,
    #[serde(default)]
    server: ServerSettingsFile,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrencySettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cache_ttl_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    offline_rates: HashMap<String, Decimal>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerSettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bind: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Currency conversion settings
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencySettings {
    /// Currency every balance is stored in
    pub base_currency: String,
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub cache_ttl: Duration,
    /// Static rates used when no API key is configured or offline mode is on
    pub offline_rates: HashMap<String, Decimal>,
    pub offline: bool,
}

impl Default for CurrencySettings {
    fn default() -> Self {
        Self {
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            api_url: DEFAULT_RATES_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(60),
            offline_rates: HashMap::new(),
            offline: false,
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// Wallet configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub currency: CurrencySettings,
    pub server: ServerSettings,
    // Keep the raw settings for preservation when saving
    raw_settings: SettingsFile,
}

impl Config {
    /// Load config from the wallet directory
    ///
    /// Environment overrides, applied after the file:
    /// - `WALLET_CURRENCY_API_KEY`
    /// - `WALLET_BIND`
    /// - `WALLET_OFFLINE_CURRENCY` (true/1/yes)
    pub fn load(wallet_dir: &Path) -> Result<Self> {
        let mut config = Self::load_file(wallet_dir)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load only what settings.json says, ignoring environment overrides
    pub fn load_file(wallet_dir: &Path) -> Result<Self> {
        let settings_path = wallet_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid settings file: {}", settings_path.display()))?
        } else {
            SettingsFile::default()
        };

        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: SettingsFile) -> Self {
        let defaults = CurrencySettings::default();
        let c = &raw.currency;
        let currency = CurrencySettings {
            base_currency: c
                .base_currency
                .as_deref()
                .map(normalize_currency_code)
                .filter(|code| !code.is_empty())
                .unwrap_or(defaults.base_currency),
            api_url: c.api_url.clone().unwrap_or(defaults.api_url),
            api_key: c.api_key.clone().filter(|k| !k.is_empty()),
            timeout: c.timeout_secs.map(Duration::from_secs).unwrap_or(defaults.timeout),
            cache_ttl: c
                .cache_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            offline_rates: c
                .offline_rates
                .iter()
                .map(|(code, rate)| (normalize_currency_code(code), *rate))
                .collect(),
            offline: false,
        };
        let server = ServerSettings {
            bind: raw.server.bind.clone().unwrap_or_else(|| DEFAULT_BIND.to_string()),
        };

        Self {
            currency,
            server,
            raw_settings: raw,
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var("WALLET_CURRENCY_API_KEY").filter(|k| !k.is_empty()) {
            self.currency.api_key = Some(key);
        }
        if let Some(bind) = var("WALLET_BIND").filter(|b| !b.is_empty()) {
            self.server.bind = bind;
        }
        match var("WALLET_OFFLINE_CURRENCY").as_deref() {
            Some("true" | "1" | "yes" | "TRUE" | "YES") => self.currency.offline = true,
            Some("false" | "0" | "no" | "FALSE" | "NO") => self.currency.offline = false,
            _ => {}
        }
    }

    /// Change one setting by its settings.json path
    ///
    /// Accepted keys are listed in [`SETTABLE_KEYS`]; an offline rate is
    /// set with `currency.offlineRates.<CODE>`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "server.bind" => {
                if value.is_empty() {
                    bail!("server.bind must not be empty");
                }
                self.server.bind = value.to_string();
            }
            "currency.apiUrl" => {
                if !value.starts_with("http://") && !value.starts_with("https://") {
                    bail!("currency.apiUrl must be an http(s) URL");
                }
                self.currency.api_url = value.to_string();
            }
            "currency.timeoutSecs" => self.currency.timeout = parse_secs(key, value)?,
            "currency.cacheTtlSecs" => self.currency.cache_ttl = parse_secs(key, value)?,
            _ => match key.strip_prefix("currency.offlineRates.") {
                Some(code) if !code.trim().is_empty() => {
                    let rate = Decimal::from_str(value)
                        .ok()
                        .filter(|rate| *rate > Decimal::ZERO)
                        .with_context(|| format!("{} must be a positive number", key))?;
                    self.currency
                        .offline_rates
                        .insert(normalize_currency_code(code), rate);
                }
                _ => bail!(
                    "Unknown setting '{}'. Settable keys: {}",
                    key,
                    SETTABLE_KEYS.join(", ")
                ),
            },
        }
        Ok(())
    }

    /// Save config to the wallet directory
    ///
    /// Only the fields this crate manages are rewritten; secrets that came
    /// from the environment are not persisted.
    pub fn save(&self, wallet_dir: &Path) -> Result<()> {
        let settings_path = wallet_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_else(|_| self.raw_settings.clone())
        } else {
            self.raw_settings.clone()
        };

        settings.currency.base_currency = Some(self.currency.base_currency.clone());
        settings.currency.api_url = Some(self.currency.api_url.clone());
        settings.currency.timeout_secs = Some(self.currency.timeout.as_secs());
        settings.currency.cache_ttl_secs = Some(self.currency.cache_ttl.as_secs());
        settings.currency.offline_rates = self.currency.offline_rates.clone();
        settings.server.bind = Some(self.server.bind.clone());

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    value
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .with_context(|| format!("{} must be a whole number of seconds", key))
}

/// Trim and upper-case an ISO 4217 code
pub fn normalize_currency_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
