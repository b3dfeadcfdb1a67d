//! Earnings implied move vs. historical earnings moves.
//!
//! The ATM straddle premium on the first expiration after earnings is the
//! market's priced-in move. Comparing it to the average realized earnings
//! move classifies the options as:
//! - Cheap: implied below history by at least the edge threshold
//! - Expensive: implied above history by at least the edge threshold
//! - Fair: anything in between
//!
//! Only earnings inside a short horizon are considered; further out, the
//! straddle prices ordinary volatility as much as the event.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::debug;

use crate::data::{HistoricalMove, OptionContract, OptionsSnapshot};

/// Direction of a realized earnings move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Implied vs. historical pricing of the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Cheap,
    Fair,
    Expensive,
}

impl Edge {
    /// Classify the implied-minus-historical spread in percentage points.
    pub fn classify(edge_percent: f64, threshold: f64) -> Self {
        if edge_percent <= -threshold {
            Self::Cheap
        } else if edge_percent >= threshold {
            Self::Expensive
        } else {
            Self::Fair
        }
    }

    /// Whether the straddle looks like a buy into earnings.
    pub fn favors_buying(&self) -> bool {
        matches!(self, Self::Cheap)
    }
}

/// Realized move for one past earnings event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsMove {
    pub date: NaiveDate,
    pub price_change: Decimal,
    /// |change| / price before, in percent
    pub move_percent: f64,
    pub direction: MoveDirection,
}

impl EarningsMove {
    /// `None` when the pre-event price is unusable.
    pub fn from_historical(m: &HistoricalMove) -> Option<Self> {
        if m.price_before <= Decimal::ZERO {
            return None;
        }
        let change = m.price_change();
        let pct = change.abs() / m.price_before * Decimal::ONE_HUNDRED;

        Some(Self {
            date: m.date,
            price_change: change,
            move_percent: pct.try_into().unwrap_or(0.0),
            direction: if change >= Decimal::ZERO {
                MoveDirection::Up
            } else {
                MoveDirection::Down
            },
        })
    }
}

/// The at-the-money call/put pair used for pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Straddle {
    pub expiration: Option<NaiveDate>,
    pub call: OptionContract,
    pub put: OptionContract,
    pub total_premium: Decimal,
}

/// Result of an implied move computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpliedMoveSummary {
    pub symbol: String,
    pub spot_price: Decimal,
    pub days_to_earnings: i64,
    pub atm_straddle: Straddle,
    /// Dollars
    pub implied_move: Decimal,
    pub implied_move_percent: f64,
    /// Most recent first
    pub historical_moves: Vec<EarningsMove>,
    pub avg_historical_move_percent: f64,
    pub historical_move_std_dev: Option<f64>,
    pub implied_vs_history_z_score: Option<f64>,
    pub edge: Option<Edge>,
    pub edge_percent: Option<f64>,
}

/// Implied move engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpliedMoveConfig {
    /// Earnings further out than this are not actionable.
    pub horizon_days: i64,
    /// Band (percentage points) around the historical average counted as fair.
    pub edge_threshold_pct: f64,
    /// Historical moves kept in the summary.
    pub max_history: usize,
}

impl Default for ImpliedMoveConfig {
    fn default() -> Self {
        Self {
            horizon_days: 14,
            edge_threshold_pct: 1.0,
            max_history: 6,
        }
    }
}

/// Implied move engine.
#[derive(Debug, Clone, Default)]
pub struct ImpliedMoveEngine {
    config: ImpliedMoveConfig,
}

impl ImpliedMoveEngine {
    pub fn new(config: ImpliedMoveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImpliedMoveConfig {
        &self.config
    }

    /// Pick the straddle on the first expiration on or after earnings.
    ///
    /// Call and put are each the strike nearest spot, ties going to the
    /// lower strike.
    pub fn select_straddle(
        &self,
        snapshot: &OptionsSnapshot,
        earnings_date: NaiveDate,
    ) -> Option<Straddle> {
        let chain = snapshot.first_chain_on_or_after(earnings_date)?;
        let call = chain.nearest_call(snapshot.spot_price)?.clone();
        let put = chain.nearest_put(snapshot.spot_price)?.clone();

        Some(Straddle {
            expiration: Some(chain.expiration),
            total_premium: call.last + put.last,
            call,
            put,
        })
    }

    /// Select the straddle from a snapshot and compute the implied move.
    pub fn analyze_snapshot(
        &self,
        snapshot: &OptionsSnapshot,
        earnings_date: NaiveDate,
        historical_moves: &[HistoricalMove],
    ) -> Option<ImpliedMoveSummary> {
        let days_to_earnings = (earnings_date - snapshot.as_of).num_days();
        if !self.in_horizon(days_to_earnings) {
            debug!(
                symbol = %snapshot.symbol,
                days_to_earnings,
                "Implied move not applicable: earnings outside horizon"
            );
            return None;
        }

        let straddle = self.select_straddle(snapshot, earnings_date)?;
        let mut summary = self.compute_implied_move(
            &snapshot.symbol,
            snapshot.spot_price,
            &straddle.call,
            &straddle.put,
            days_to_earnings,
            historical_moves,
        )?;
        summary.atm_straddle.expiration = straddle.expiration;
        Some(summary)
    }

    fn in_horizon(&self, days_to_earnings: i64) -> bool {
        (0..=self.config.horizon_days).contains(&days_to_earnings)
    }

    /// Compute the implied move, or `None` when it is not applicable.
    pub fn compute_implied_move(
        &self,
        symbol: &str,
        spot_price: Decimal,
        atm_call: &OptionContract,
        atm_put: &OptionContract,
        days_to_earnings: i64,
        historical_moves: &[HistoricalMove],
    ) -> Option<ImpliedMoveSummary> {
        if !self.in_horizon(days_to_earnings) {
            debug!(symbol, days_to_earnings, "Implied move not applicable: outside horizon");
            return None;
        }
        if spot_price <= Decimal::ZERO {
            debug!(symbol, "Implied move not applicable: non-positive spot");
            return None;
        }
        if atm_call.last <= Decimal::ZERO || atm_put.last <= Decimal::ZERO {
            debug!(symbol, "Implied move not applicable: missing straddle quote");
            return None;
        }

        let total_premium = atm_call.last + atm_put.last;
        let implied_move_percent: f64 = (total_premium / spot_price * Decimal::ONE_HUNDRED)
            .try_into()
            .unwrap_or(0.0);

        let mut moves: Vec<EarningsMove> = historical_moves
            .iter()
            .filter_map(EarningsMove::from_historical)
            .collect();

        let magnitudes: Vec<f64> = moves.iter().map(|m| m.move_percent).collect();
        let avg_historical_move_percent = if magnitudes.is_empty() {
            0.0
        } else {
            magnitudes.iter().sum::<f64>() / magnitudes.len() as f64
        };
        let historical_move_std_dev = if magnitudes.len() >= 2 {
            Some(magnitudes.iter().std_dev())
        } else {
            None
        };

        let (edge, edge_percent) = if magnitudes.is_empty() {
            (None, None)
        } else {
            let edge_percent = implied_move_percent - avg_historical_move_percent;
            (
                Some(Edge::classify(edge_percent, self.config.edge_threshold_pct)),
                Some(edge_percent),
            )
        };

        let implied_vs_history_z_score = match (edge_percent, historical_move_std_dev) {
            (Some(diff), Some(sd)) if sd > 0.0 => Some(diff / sd),
            _ => None,
        };

        moves.sort_by(|a, b| b.date.cmp(&a.date));
        moves.truncate(self.config.max_history);

        Some(ImpliedMoveSummary {
            symbol: symbol.to_string(),
            spot_price,
            days_to_earnings,
            atm_straddle: Straddle {
                expiration: None,
                call: atm_call.clone(),
                put: atm_put.clone(),
                total_premium,
            },
            implied_move: total_premium,
            implied_move_percent,
            historical_moves: moves,
            avg_historical_move_percent,
            historical_move_std_dev,
            implied_vs_history_z_score,
            edge,
            edge_percent,
        })
    }
}
