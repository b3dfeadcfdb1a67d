//! Options analytics module.
//!
//! Provides:
//! - Dealer gamma exposure by strike (pinned/volatile regime, key levels)
//! - Earnings implied move vs. historical moves (cheap/fair/expensive)
//! - Options flow (premium volume, put/call balance, unusual activity)

pub mod gamma_exposure;
pub mod implied_move;
pub mod options_flow;

pub use gamma_exposure::{
    AllowList, GammaExposureEngine, GammaRegime, GexConfig, GexLevel, GexSummary, LevelType,
    StrikeGex, SymbolFilter,
};
pub use implied_move::{
    Edge, EarningsMove, ImpliedMoveConfig, ImpliedMoveEngine, ImpliedMoveSummary, MoveDirection,
    Straddle,
};
pub use options_flow::{
    FlowConfig, FlowSentiment, FlowSummary, OptionsFlowAnalyzer, UnusualActivity,
};
