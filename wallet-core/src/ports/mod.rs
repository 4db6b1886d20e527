//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod rate_provider;
mod repository;

pub use rate_provider::RateProvider;
pub use repository::{BalanceUpdate, CommitOutcome, LedgerCommit, LedgerTotals, Repository};
