//! Wallet Core - Business logic for a ledger-backed digital wallet
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (User, Transaction, Product, etc.)
//! - **ports**: Trait definitions for external dependencies (Repository, RateProvider)
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete implementations (DuckDB, currencyapi.com, static rates)

pub mod domain;
pub mod ports;
pub mod services;
pub mod adapters;
pub mod config;
pub mod migrations;
pub mod log_migrations;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use adapters::currency_api::CurrencyApiClient;
use adapters::duckdb::DuckDbRepository;
use adapters::fixed_rates::FixedRates;
use config::{Config, CurrencySettings};
use ports::{RateProvider, Repository};
use services::*;

// Re-export commonly used types at crate root
pub use domain::{
    BasicCredentials, NewProduct, Product, Transaction, TransactionKind, TransactionSource, User,
};
pub use domain::result::{Result as WalletResult, WalletError};
pub use services::{BalanceView, Caller, EntryPoint, HistoryAudit, StatusSummary, WalletService};

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Main context for wallet operations
///
/// This is the primary entry point for all business logic. It holds
/// the store, configuration, and all services.
pub struct WalletContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub wallet: Arc<WalletService>,
    pub status_service: StatusService,
    pub logger: Option<Arc<LoggingService>>,
}

impl WalletContext {
    /// Open (or create) the wallet stored in `wallet_dir`
    ///
    /// Builds the currency client when an API key is configured and offline
    /// mode is off; otherwise balances convert with the configured static
    /// rates. The event log is optional and never blocks startup.
    pub fn new(wallet_dir: &Path, entry_point: EntryPoint) -> Result<Self> {
        std::fs::create_dir_all(wallet_dir)?;
        let config = Config::load(wallet_dir)?;

        let repository = Arc::new(DuckDbRepository::new(&wallet_dir.join("wallet.duckdb"))?);
        repository.ensure_schema()?;

        let rates = rate_provider(&config.currency)?;
        debug!(provider = rates.name(), "rate provider selected");

        let logger = match LoggingService::new(wallet_dir, entry_point, APP_VERSION) {
            Ok(logger) => Some(Arc::new(logger)),
            Err(e) => {
                warn!("event log unavailable: {}", e);
                None
            }
        };

        let store: Arc<dyn Repository> = repository.clone();
        let mut wallet = WalletService::new(
            Arc::clone(&store),
            CredentialService::new(Arc::clone(&store)),
            rates,
            config.currency.base_currency.clone(),
        );
        if let Some(logger) = &logger {
            wallet = wallet.with_event_log(Arc::clone(logger));
        }
        let status_service = StatusService::new(store, config.currency.base_currency.clone());

        Ok(Self {
            config,
            repository,
            wallet: Arc::new(wallet),
            status_service,
            logger,
        })
    }
}

fn rate_provider(settings: &CurrencySettings) -> Result<Arc<dyn RateProvider>> {
    if settings.offline || settings.api_key.is_none() {
        return Ok(Arc::new(FixedRates::new(settings.offline_rates.clone())));
    }
    Ok(Arc::new(CurrencyApiClient::new(settings)?))
}
