//! Validation module for options-chain snapshots.
//!
//! Reports data quality before the engines run: coverage of open interest
//! and gamma, value ranges, and stale expirations.

pub mod chain_integrity;

pub use chain_integrity::{ChainIntegrityReport, ChainIntegrityValidator, CheckResult};
