//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the Repository port
//! - currencyapi.com HTTP client for the RateProvider port
//! - A static rate table for offline use and tests

pub mod currency_api;
pub mod duckdb;
pub mod fixed_rates;
