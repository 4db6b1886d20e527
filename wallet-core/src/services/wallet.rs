//! Wallet service - the operations exposed to the CLI and HTTP server
//!
//! Composes the credential store, authentication gate, ledger, catalog and
//! currency converter. Each operation emits one event to the event log and
//! a tracing span; neither ever carries usernames or amounts.

use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::normalize_currency_code;
use crate::domain::money::MINOR_UNIT_SCALE;
use crate::domain::result::Result;
use crate::domain::{BasicCredentials, NewProduct, Product, Transaction, User};
use crate::ports::{RateProvider, Repository};

use super::auth::{AuthGate, Caller};
use super::catalog::CatalogService;
use super::credential::CredentialService;
use super::ledger::{HistoryAudit, LedgerService};
use super::logging::{LogEvent, LoggingService};

/// A balance expressed in some currency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceView {
    pub balance: Decimal,
    pub currency: String,
}

pub struct WalletService {
    credentials: Arc<CredentialService>,
    gate: AuthGate,
    ledger: LedgerService,
    catalog: CatalogService,
    rates: Arc<dyn RateProvider>,
    base_currency: String,
    events: Option<Arc<LoggingService>>,
}

impl WalletService {
    pub fn new(
        repository: Arc<dyn Repository>,
        credentials: CredentialService,
        rates: Arc<dyn RateProvider>,
        base_currency: impl Into<String>,
    ) -> Self {
        let credentials = Arc::new(credentials);
        Self {
            gate: AuthGate::new(Arc::clone(&credentials)),
            credentials,
            ledger: LedgerService::new(Arc::clone(&repository)),
            catalog: CatalogService::new(repository),
            rates,
            base_currency: normalize_currency_code(&base_currency.into()),
            events: None,
        }
    }

    /// Record operation events to the given event log
    pub fn with_event_log(mut self, events: Arc<LoggingService>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    pub fn rate_provider(&self) -> &str {
        self.rates.name()
    }

    /// Log the outcome of an operation; logging failures are ignored
    fn observe<T>(&self, op: &str, ok_event: &str, fail_event: &str, result: Result<T>) -> Result<T> {
        if let Some(events) = &self.events {
            let event = match &result {
                Ok(_) => LogEvent::new(ok_event).with_command(op),
                Err(e) => LogEvent::new(fail_event).with_command(op).with_error(e),
            };
            if let Err(e) = events.log(event) {
                debug!("event log write failed: {}", e);
            }
        }
        result
    }

    // === Unauthenticated ===

    #[instrument(name = "wallet.service.register", skip_all)]
    pub fn register(&self, username: &str, password: &str) -> Result<User> {
        let result = self.credentials.register(username, password);
        if let Ok(user) = &result {
            info!(user_id = %user.id, "user registered");
        }
        self.observe("register", "user_registered", "registration_failed", result)
    }

    /// Authenticate an `Authorization` header value
    #[instrument(name = "wallet.service.authenticate", skip_all)]
    pub fn authenticate(&self, header: Option<&str>) -> Result<Caller> {
        match self.gate.authenticate(header) {
            Ok(caller) => Ok(caller),
            Err(e) => self.observe("authenticate", "", "authentication_failed", Err(e)),
        }
    }

    /// Authenticate decoded credentials (CLI path)
    #[instrument(name = "wallet.service.authenticate", skip_all)]
    pub fn authenticate_credentials(&self, creds: &BasicCredentials) -> Result<Caller> {
        match self.gate.authenticate_credentials(creds) {
            Ok(caller) => Ok(caller),
            Err(e) => self.observe("authenticate", "", "authentication_failed", Err(e)),
        }
    }

    #[instrument(name = "wallet.service.list_products", skip_all)]
    pub fn list_products(&self) -> Result<Vec<Product>> {
        let result = self.catalog.list_products();
        self.observe("list_products", "products_listed", "product_list_failed", result)
    }

    // === Authenticated ===

    #[instrument(name = "wallet.service.fund", skip_all, fields(user_id = %caller.user_id()))]
    pub fn fund(&self, caller: &Caller, amount: Decimal) -> Result<Decimal> {
        let result = self.ledger.fund(caller.user_id(), amount);
        self.observe("fund", "wallet_funded", "funding_failed", result)
    }

    #[instrument(name = "wallet.service.pay", skip_all, fields(user_id = %caller.user_id()))]
    pub fn pay(&self, caller: &Caller, to: &str, amount: Decimal) -> Result<Decimal> {
        let result = self.ledger.transfer(caller.user_id(), to, amount);
        self.observe("pay", "payment_sent", "payment_failed", result)
    }

    /// Balance in the base currency, or converted when `currency` is given
    ///
    /// A blank currency means the base currency. The conversion rate is
    /// fetched without holding any ledger claim.
    #[instrument(name = "wallet.service.balance", skip_all, fields(user_id = %caller.user_id()))]
    pub fn balance(&self, caller: &Caller, currency: Option<&str>) -> Result<BalanceView> {
        let result = self.balance_view(caller, currency);
        self.observe("balance", "balance_viewed", "balance_failed", result)
    }

    fn balance_view(&self, caller: &Caller, currency: Option<&str>) -> Result<BalanceView> {
        let balance = self.ledger.balance(caller.user_id())?;

        let code = currency
            .map(normalize_currency_code)
            .filter(|code| !code.is_empty());

        match code {
            None => Ok(BalanceView {
                balance,
                currency: self.base_currency.clone(),
            }),
            Some(code) if code == self.base_currency => Ok(BalanceView {
                balance,
                currency: code,
            }),
            Some(code) => {
                let rate = self.rates.rate(&code)?;
                debug!(currency = %code, provider = self.rates.name(), "converted balance");
                Ok(BalanceView {
                    balance: convert(balance, rate),
                    currency: code,
                })
            }
        }
    }

    #[instrument(name = "wallet.service.history", skip_all, fields(user_id = %caller.user_id()))]
    pub fn history(&self, caller: &Caller) -> Result<Vec<Transaction>> {
        let result = self.ledger.history(caller.user_id());
        self.observe("history", "statement_viewed", "statement_failed", result)
    }

    #[instrument(name = "wallet.service.add_product", skip_all, fields(user_id = %caller.user_id()))]
    pub fn add_product(&self, caller: &Caller, input: NewProduct) -> Result<Product> {
        let result = self.catalog.add_product(input);
        if let Ok(product) = &result {
            info!(product_id = %product.id, "product added");
        }
        self.observe("add_product", "product_added", "product_rejected", result)
    }

    #[instrument(name = "wallet.service.buy", skip_all, fields(user_id = %caller.user_id(), product_id = %product_id))]
    pub fn buy(&self, caller: &Caller, product_id: Uuid) -> Result<Decimal> {
        let result = self.ledger.purchase(caller.user_id(), product_id);
        self.observe("buy", "product_purchased", "purchase_failed", result)
    }

    #[instrument(name = "wallet.service.audit", skip_all, fields(user_id = %caller.user_id()))]
    pub fn audit(&self, caller: &Caller) -> Result<HistoryAudit> {
        let result = self.ledger.verify_history(caller.user_id());
        self.observe("audit", "history_audited", "audit_failed", result)
    }
}

/// Multiply by the rate and round to the minor unit, half away from zero
fn convert(balance: Decimal, rate: Decimal) -> Decimal {
    (balance * rate).round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}
