//! Analytics service boundary.
//!
//! Wraps the engines behind request/response types and maps
//! not-applicable results to `{"available": false}`.

pub mod api;
pub mod batch;

pub use api::{Availability, GexRequest, ImpliedMoveRequest, Unavailable};
pub use batch::{load_snapshots, run_gex_batch, BatchItem};

use chrono::NaiveDate;

use crate::analytics::{
    FlowSummary, GammaExposureEngine, GexSummary, ImpliedMoveEngine, ImpliedMoveSummary,
    OptionsFlowAnalyzer,
};
use crate::config::AnalyticsConfig;
use crate::data::{HistoricalMove, OptionsSnapshot};
use crate::validation::{ChainIntegrityReport, ChainIntegrityValidator};

/// All engines built from one configuration.
#[derive(Clone)]
pub struct AnalyticsService {
    gex: GammaExposureEngine,
    implied_move: ImpliedMoveEngine,
    flow: OptionsFlowAnalyzer,
}

impl Default for AnalyticsService {
    fn default() -> Self {
        Self::new(AnalyticsConfig::default())
    }
}

impl AnalyticsService {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self {
            gex: GammaExposureEngine::new(config.gex),
            implied_move: ImpliedMoveEngine::new(config.implied_move),
            flow: OptionsFlowAnalyzer::new(config.flow),
        }
    }

    /// Swap in a custom GEX engine (e.g. one with an injected symbol filter).
    pub fn with_gex_engine(mut self, engine: GammaExposureEngine) -> Self {
        self.gex = engine;
        self
    }

    pub fn gex_engine(&self) -> &GammaExposureEngine {
        &self.gex
    }

    pub fn implied_move_engine(&self) -> &ImpliedMoveEngine {
        &self.implied_move
    }

    pub fn handle_gex(&self, request: &GexRequest) -> Availability<GexSummary> {
        self.gex
            .compute_gex(
                &request.symbol,
                request.spot_price,
                &request.calls,
                &request.puts,
            )
            .into()
    }

    pub fn handle_implied_move(
        &self,
        request: &ImpliedMoveRequest,
    ) -> Availability<ImpliedMoveSummary> {
        self.implied_move
            .compute_implied_move(
                &request.symbol,
                request.spot_price,
                &request.atm_call,
                &request.atm_put,
                request.days_to_earnings,
                &request.historical_moves,
            )
            .into()
    }

    /// GEX across every expiration in the snapshot.
    pub fn gex_for_snapshot(&self, snapshot: &OptionsSnapshot) -> Availability<GexSummary> {
        self.gex
            .compute_gex(
                &snapshot.symbol,
                snapshot.spot_price,
                &snapshot.all_calls(),
                &snapshot.all_puts(),
            )
            .into()
    }

    pub fn implied_move_for_snapshot(
        &self,
        snapshot: &OptionsSnapshot,
        earnings_date: NaiveDate,
        historical_moves: &[HistoricalMove],
    ) -> Availability<ImpliedMoveSummary> {
        self.implied_move
            .analyze_snapshot(snapshot, earnings_date, historical_moves)
            .into()
    }

    pub fn flow(&self, snapshot: &OptionsSnapshot) -> FlowSummary {
        self.flow.analyze(snapshot)
    }

    pub fn validate(&self, snapshot: &OptionsSnapshot) -> ChainIntegrityReport {
        ChainIntegrityValidator::new().validate(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::OptionContract;
    use rust_decimal_macros::dec;

    fn contract(strike: rust_decimal::Decimal, oi: i64, gamma: f64) -> OptionContract {
        let mut c = OptionContract::new(strike);
        c.open_interest = Some(oi);
        c.gamma = Some(gamma);
        c
    }

    #[test]
    fn test_handle_gex_unavailable_for_empty_chain() {
        let service = AnalyticsService::default();
        let request = GexRequest {
            symbol: "SPY".to_string(),
            spot_price: dec!(100),
            calls: vec![],
            puts: vec![],
        };

        let response = service.handle_gex(&request);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({"available": false})
        );
    }

    #[test]
    fn test_handle_gex_available() {
        let service = AnalyticsService::default();
        let request = GexRequest {
            symbol: "SPY".to_string(),
            spot_price: dec!(100),
            calls: vec![contract(dec!(100), 1000, 0.05)],
            puts: vec![contract(dec!(100), 500, 0.04)],
        };

        let json = serde_json::to_value(service.handle_gex(&request)).unwrap();
        assert_eq!(json["regime"], "pinned");
        assert_eq!(json["symbol"], "SPY");
        assert!(json["keyLevels"].is_array());
    }

    #[test]
    fn test_gex_spot_is_exact() {
        let json = r#"{
            "symbol": "SPY",
            "spotPrice": 101.37,
            "calls": [{"strike": 100, "openInterest": 1000, "gamma": 0.05}],
            "puts": [{"strike": 100, "openInterest": 10, "gamma": 0.01}]
        }"#;
        let request: GexRequest = serde_json::from_str(json).unwrap();
        let summary = AnalyticsService::default()
            .handle_gex(&request)
            .into_option()
            .unwrap();

        assert_eq!(summary.spot_price, dec!(101.37));
        // No sign change, so the flip level is spot itself.
        assert_eq!(summary.flip_level, dec!(101.37));
    }

    #[test]
    fn test_injected_filter() {
        let engine = GammaExposureEngine::default().with_filter(|_: &str| false);
        let service = AnalyticsService::default().with_gex_engine(engine);
        let request = GexRequest {
            symbol: "SPY".to_string(),
            spot_price: dec!(100),
            calls: vec![contract(dec!(100), 1000, 0.05)],
            puts: vec![contract(dec!(100), 500, 0.04)],
        };
        assert!(!service.handle_gex(&request).is_available());
    }

    #[test]
    fn test_handle_implied_move_request() {
        let json = r#"{
            "symbol": "NVDA",
            "spotPrice": 200,
            "atmCall": {"strike": 200, "last": 5.0},
            "atmPut": {"strike": 200, "last": 4.5},
            "daysToEarnings": 20,
            "historicalMoves": [
                {"date": "2024-02-21", "priceBefore": 100, "priceAfter": 103}
            ]
        }"#;
        let mut request: ImpliedMoveRequest = serde_json::from_str(json).unwrap();
        let service = AnalyticsService::default();

        assert!(!service.handle_implied_move(&request).is_available());

        request.days_to_earnings = 3;
        let summary = service.handle_implied_move(&request).into_option().unwrap();
        assert_eq!(summary.implied_move, dec!(9.5));
        assert_eq!(summary.edge, Some(crate::analytics::Edge::Expensive));
    }
}
