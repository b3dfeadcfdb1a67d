//! Options-market analytics.
//!
//! Engines over options-chain snapshots:
//! - [`analytics::GammaExposureEngine`]: dealer gamma by strike, regime and key levels
//! - [`analytics::ImpliedMoveEngine`]: earnings move priced by the ATM straddle vs. history
//! - [`analytics::OptionsFlowAnalyzer`]: premium volume, put/call balance, unusual activity
//!
//! [`service::AnalyticsService`] wraps them behind request/response types.

pub mod analytics;
pub mod config;
pub mod data;
pub mod service;
pub mod validation;

// Re-export commonly used types
pub use analytics::{
    Edge, FlowSummary, GammaExposureEngine, GammaRegime, GexSummary, ImpliedMoveEngine,
    ImpliedMoveSummary, OptionsFlowAnalyzer, SymbolFilter,
};
pub use config::{AnalyticsConfig, ConfigError};
pub use data::{HistoricalMove, OptionContract, OptionType, OptionsChain, OptionsSnapshot};
pub use service::{AnalyticsService, Availability, GexRequest, ImpliedMoveRequest};
pub use validation::{ChainIntegrityReport, ChainIntegrityValidator};
