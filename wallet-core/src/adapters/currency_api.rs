//! currencyapi.com client
//!
//! Fetches the full rate table for the base currency in one request and
//! caches it for a short TTL. Any failure (timeout, non-2xx, bad body,
//! missing code) is reported as the rate being unavailable.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::CurrencySettings;
use crate::domain::result::{Result as DomainResult, WalletError};
use crate::ports::RateProvider;

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    data: HashMap<String, RateEntry>,
}

#[derive(Debug, Deserialize)]
struct RateEntry {
    value: Decimal,
}

struct CachedRates {
    fetched_at: Instant,
    rates: HashMap<String, Decimal>,
}

pub struct CurrencyApiClient {
    client: Client,
    url: Url,
    api_key: String,
    base_currency: String,
    timeout: Duration,
    cache_ttl: Duration,
    cache: Mutex<Option<CachedRates>>,
}

impl CurrencyApiClient {
    /// Build a client from settings; requires an API key
    pub fn new(settings: &CurrencySettings) -> Result<Self> {
        let url = Url::parse(&settings.api_url).context("Invalid currency API URL")?;
        if url.scheme() != "https" && url.scheme() != "http" {
            anyhow::bail!("Currency API URL must be http(s)");
        }
        let api_key = settings
            .api_key
            .clone()
            .context("No currency API key configured")?;

        let client = Client::builder().timeout(settings.timeout).build()?;

        Ok(Self {
            client,
            url,
            api_key,
            base_currency: settings.base_currency.clone(),
            timeout: settings.timeout,
            cache_ttl: settings.cache_ttl,
            cache: Mutex::new(None),
        })
    }

    /// Fetch the latest rate table from the API
    #[instrument(name = "wallet.currency.fetch_rates", skip(self), fields(base = %self.base_currency))]
    pub fn fetch_rates(&self) -> Result<HashMap<String, Decimal>> {
        let response = self
            .client
            .get(self.url.clone())
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("base_currency", self.base_currency.as_str()),
            ])
            .send()
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Currency API returned HTTP {}", status.as_u16());
        }

        let body = response.text().context("Failed to read currency API response")?;
        let rates = parse_rates(&body)?;
        debug!(count = rates.len(), "fetched exchange rates");
        Ok(rates)
    }

    fn map_request_error(&self, error: reqwest::Error) -> anyhow::Error {
        if error.is_timeout() {
            anyhow::anyhow!(
                "Currency API timed out after {} seconds",
                self.timeout.as_secs()
            )
        } else if error.is_connect() {
            anyhow::anyhow!("Unable to connect to currency API")
        } else {
            anyhow::anyhow!("Currency API request failed: {}", error)
        }
    }

    /// Answer from a fresh cached table; `None` when a fetch is needed
    ///
    /// A code absent from a fresh table is unavailable until the TTL runs out.
    fn cached_rate(&self, code: &str) -> Option<DomainResult<Decimal>> {
        let cache = self.cache.lock().ok()?;
        let cached = cache.as_ref()?;
        if cached.fetched_at.elapsed() > self.cache_ttl {
            return None;
        }
        Some(cached.rates.get(code).copied().ok_or_else(|| missing_rate(code)))
    }

    fn store(&self, rates: HashMap<String, Decimal>) {
        if let Ok(mut cache) = self.cache.lock() {
            *cache = Some(CachedRates {
                fetched_at: Instant::now(),
                rates,
            });
        }
    }
}

fn missing_rate(code: &str) -> WalletError {
    WalletError::unavailable(format!("No rate for currency {}", code))
}

impl RateProvider for CurrencyApiClient {
    fn name(&self) -> &str {
        "currencyapi"
    }

    fn rate(&self, code: &str) -> DomainResult<Decimal> {
        if let Some(cached) = self.cached_rate(code) {
            return cached;
        }

        let rates = self.fetch_rates().map_err(|e| {
            warn!("currency rate lookup failed: {:#}", e);
            WalletError::unavailable("Currency API unavailable")
        })?;
        let rate = rates.get(code).copied();
        self.store(rates);

        rate.ok_or_else(|| missing_rate(code))
    }
}

/// Parse a `/v3/latest` body into code -> rate, dropping non-positive rates
fn parse_rates(body: &str) -> Result<HashMap<String, Decimal>> {
    let parsed: LatestRatesResponse =
        serde_json::from_str(body).context("Malformed currency API response")?;
    Ok(parsed
        .data
        .into_iter()
        .filter(|(_, entry)| entry.value > Decimal::ZERO)
        .map(|(code, entry)| (code.to_ascii_uppercase(), entry.value))
        .collect())
}
