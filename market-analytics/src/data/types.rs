//! Core data types for options-chain snapshots.
//!
//! These mirror the shape delivered by the upstream quote provider (camelCase
//! JSON), while using `Decimal` for strikes and prices so strikes can key
//! ordered maps without float comparison games.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Standard equity option contract multiplier.
pub const CONTRACT_MULTIPLIER: f64 = 100.0;

/// Option type (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "C" | "CALL" => Some(Self::Call),
            "P" | "PUT" => Some(Self::Put),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "C",
            Self::Put => "P",
        }
    }
}

/// One leg of an options chain at one strike/expiration.
///
/// Greeks and open interest are optional because the provider omits them
/// for illiquid strikes. Contracts missing either are skipped by the GEX
/// aggregation rather than counted as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionContract {
    /// Strike price
    pub strike: Decimal,

    /// Side of the chain, when the provider tags it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_type: Option<OptionType>,

    /// Outstanding contracts
    #[serde(default)]
    pub open_interest: Option<i64>,

    /// Contracts traded in the session
    #[serde(default)]
    pub volume: i64,

    /// Last traded premium
    #[serde(default)]
    pub last: Decimal,

    #[serde(default)]
    pub implied_volatility: Option<f64>,

    #[serde(default)]
    pub delta: Option<f64>,

    /// Per-contract gamma
    #[serde(default)]
    pub gamma: Option<f64>,

    #[serde(default)]
    pub theta: Option<f64>,

    #[serde(default)]
    pub vega: Option<f64>,
}

impl OptionContract {
    /// Bare contract at a strike; the remaining fields are filled in by the caller.
    pub fn new(strike: Decimal) -> Self {
        Self {
            strike,
            option_type: None,
            open_interest: None,
            volume: 0,
            last: Decimal::ZERO,
            implied_volatility: None,
            delta: None,
            gamma: None,
            theta: None,
            vega: None,
        }
    }

    /// Strike as f64 for numeric work.
    pub fn strike_f64(&self) -> f64 {
        self.strike.try_into().unwrap_or(0.0)
    }

    /// Open interest and gamma, if this contract can contribute to GEX.
    ///
    /// Zero open interest and zero or non-finite gamma count as missing.
    pub fn gex_inputs(&self) -> Option<(i64, f64)> {
        let oi = self.open_interest.filter(|&oi| oi > 0)?;
        let gamma = self.gamma.filter(|g| g.is_finite() && *g != 0.0)?;
        Some((oi, gamma))
    }

    /// Dollar premium traded in the session (`volume * last * 100`).
    pub fn premium_volume(&self) -> f64 {
        let last: f64 = self.last.try_into().unwrap_or(0.0);
        self.volume as f64 * last * CONTRACT_MULTIPLIER
    }
}

/// All options for a single expiration date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsChain {
    /// Expiration date for this chain
    pub expiration: NaiveDate,

    #[serde(default)]
    pub calls: Vec<OptionContract>,

    #[serde(default)]
    pub puts: Vec<OptionContract>,
}

impl OptionsChain {
    /// Create a new empty chain.
    pub fn new(expiration: NaiveDate) -> Self {
        Self {
            expiration,
            calls: Vec::new(),
            puts: Vec::new(),
        }
    }

    /// Add a contract to the given side.
    pub fn add_contract(&mut self, option_type: OptionType, mut contract: OptionContract) {
        contract.option_type = Some(option_type);
        match option_type {
            OptionType::Call => self.calls.push(contract),
            OptionType::Put => self.puts.push(contract),
        }
    }

    /// Get all strikes available in this chain.
    pub fn strikes(&self) -> Vec<Decimal> {
        let mut strikes: Vec<_> = self
            .calls
            .iter()
            .chain(self.puts.iter())
            .map(|c| c.strike)
            .collect();
        strikes.sort();
        strikes.dedup();
        strikes
    }

    /// Call nearest to `price`, ties broken toward the lower strike.
    pub fn nearest_call(&self, price: Decimal) -> Option<&OptionContract> {
        nearest_strike(&self.calls, price)
    }

    /// Put nearest to `price`, ties broken toward the lower strike.
    pub fn nearest_put(&self, price: Decimal) -> Option<&OptionContract> {
        nearest_strike(&self.puts, price)
    }

    /// Total number of contracts on both sides.
    pub fn len(&self) -> usize {
        self.calls.len() + self.puts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.puts.is_empty()
    }
}

fn nearest_strike(contracts: &[OptionContract], price: Decimal) -> Option<&OptionContract> {
    contracts
        .iter()
        .min_by_key(|c| ((c.strike - price).abs(), c.strike))
}

/// Complete options snapshot for one underlying at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsSnapshot {
    /// Underlying symbol (e.g., "SPY")
    pub symbol: String,

    /// Trading date of the snapshot
    pub as_of: NaiveDate,

    /// Underlying price
    pub spot_price: Decimal,

    /// Chains ordered by expiration
    #[serde(default)]
    pub chains: Vec<OptionsChain>,
}

impl OptionsSnapshot {
    /// Create a new empty snapshot.
    pub fn new(symbol: impl Into<String>, as_of: NaiveDate, spot_price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            as_of,
            spot_price,
            chains: Vec::new(),
        }
    }

    /// Get chain for a specific expiration.
    pub fn chain_at_expiration(&self, expiration: NaiveDate) -> Option<&OptionsChain> {
        self.chains.iter().find(|c| c.expiration == expiration)
    }

    /// Earliest chain expiring on or after `date`.
    pub fn first_chain_on_or_after(&self, date: NaiveDate) -> Option<&OptionsChain> {
        self.chains
            .iter()
            .filter(|c| c.expiration >= date)
            .min_by_key(|c| c.expiration)
    }

    /// Nearest expiration that has not already passed.
    pub fn front_chain(&self) -> Option<&OptionsChain> {
        self.first_chain_on_or_after(self.as_of)
    }

    /// All calls across every expiration.
    pub fn all_calls(&self) -> Vec<OptionContract> {
        self.chains.iter().flat_map(|c| c.calls.iter().cloned()).collect()
    }

    /// All puts across every expiration.
    pub fn all_puts(&self) -> Vec<OptionContract> {
        self.chains.iter().flat_map(|c| c.puts.iter().cloned()).collect()
    }

    /// Total number of contracts in this snapshot.
    pub fn total_contracts(&self) -> usize {
        self.chains.iter().map(|c| c.len()).sum()
    }
}

/// A past earnings event: the underlying's close before and after the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalMove {
    pub date: NaiveDate,
    pub price_before: Decimal,
    pub price_after: Decimal,
}

impl HistoricalMove {
    pub fn new(date: NaiveDate, price_before: Decimal, price_after: Decimal) -> Self {
        Self {
            date,
            price_before,
            price_after,
        }
    }

    /// Raw signed change across the event.
    pub fn price_change(&self) -> Decimal {
        self.price_after - self.price_before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn contract(strike: Decimal) -> OptionContract {
        OptionContract::new(strike)
    }

    #[test]
    fn test_option_type_parsing() {
        assert_eq!(OptionType::from_str("C"), Some(OptionType::Call));
        assert_eq!(OptionType::from_str("P"), Some(OptionType::Put));
        assert_eq!(OptionType::from_str("call"), Some(OptionType::Call));
        assert_eq!(OptionType::from_str("PUT"), Some(OptionType::Put));
        assert_eq!(OptionType::from_str("X"), None);
    }

    #[test]
    fn test_gex_inputs_require_oi_and_gamma() {
        let mut c = contract(dec!(100));
        assert_eq!(c.gex_inputs(), None);

        c.open_interest = Some(10);
        assert_eq!(c.gex_inputs(), None);

        c.gamma = Some(0.05);
        assert_eq!(c.gex_inputs(), Some((10, 0.05)));

        c.open_interest = Some(0);
        assert_eq!(c.gex_inputs(), None);

        c.open_interest = Some(10);
        c.gamma = Some(f64::NAN);
        assert_eq!(c.gex_inputs(), None);
    }

    #[test]
    fn test_nearest_strike_prefers_lower_on_tie() {
        let mut chain = OptionsChain::new(NaiveDate::from_ymd_opt(2024, 1, 19).unwrap());
        chain.add_contract(OptionType::Call, contract(dec!(95)));
        chain.add_contract(OptionType::Call, contract(dec!(105)));
        chain.add_contract(OptionType::Call, contract(dec!(110)));

        let atm = chain.nearest_call(dec!(100)).unwrap();
        assert_eq!(atm.strike, dec!(95));

        let atm = chain.nearest_call(dec!(104)).unwrap();
        assert_eq!(atm.strike, dec!(105));
    }

    #[test]
    fn test_first_chain_on_or_after() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let mut snapshot = OptionsSnapshot::new("AAPL", d(2), dec!(185));
        snapshot.chains.push(OptionsChain::new(d(5)));
        snapshot.chains.push(OptionsChain::new(d(12)));
        snapshot.chains.push(OptionsChain::new(d(19)));

        assert_eq!(snapshot.first_chain_on_or_after(d(10)).unwrap().expiration, d(12));
        assert_eq!(snapshot.first_chain_on_or_after(d(12)).unwrap().expiration, d(12));
        assert!(snapshot.first_chain_on_or_after(d(20)).is_none());
        assert_eq!(snapshot.front_chain().unwrap().expiration, d(5));
    }

    #[test]
    fn test_contract_deserializes_camel_case() {
        let json = r#"{"strike": 450.5, "openInterest": 1200, "volume": 300,
                       "last": 2.35, "gamma": 0.012, "impliedVolatility": 0.18}"#;
        let c: OptionContract = serde_json::from_str(json).unwrap();
        assert_eq!(c.strike, dec!(450.5));
        assert_eq!(c.open_interest, Some(1200));
        assert_eq!(c.volume, 300);
        assert_eq!(c.last, dec!(2.35));
        assert_eq!(c.gamma, Some(0.012));
        assert_eq!(c.delta, None);
    }

    #[test]
    fn test_premium_volume() {
        let mut c = contract(dec!(100));
        c.volume = 250;
        c.last = dec!(2.00);
        assert_eq!(c.premium_volume(), 50_000.0);
    }

    #[test]
    fn test_historical_move_change() {
        let m = HistoricalMove::new(
            NaiveDate::from_ymd_opt(2023, 10, 26).unwrap(),
            dec!(170),
            dec!(166.6),
        );
        assert_eq!(m.price_change(), dec!(-3.4));
    }
}
