//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. `WalletService`
//! is the facade the CLI and HTTP server drive; the others each own one
//! feature area.

pub mod auth;
pub mod catalog;
pub mod credential;
pub mod ledger;
pub mod locks;
pub mod logging;
pub mod migration;
mod status;
pub mod wallet;

pub use auth::{AuthGate, Caller};
pub use catalog::CatalogService;
pub use credential::CredentialService;
pub use ledger::{HistoryAudit, LedgerService};
pub use locks::{LedgerGuard, UserLocks};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use status::{StatusService, StatusSummary};
pub use wallet::{BalanceView, WalletService};
