//! Options flow: premium traded, put/call balance and unusual activity.
//!
//! Premium volume is `volume * last * 100` per contract. A contract is
//! flagged as unusual (sweep-like) when the session volume exceeds its open
//! interest and the premium is large enough to matter.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::data::{OptionContract, OptionType, OptionsChain, OptionsSnapshot};

/// Directional read of the session's flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowSentiment {
    Bullish,
    Neutral,
    Bearish,
}

/// Configuration for flow analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Volume must exceed open interest times this ratio.
    pub volume_oi_ratio: f64,
    /// Minimum premium (dollars) for an unusual print.
    pub min_premium: f64,
    /// Call/put premium ratio needed to call a side dominant.
    pub sentiment_ratio: f64,
    /// Unusual contracts kept in the summary.
    pub max_unusual: usize,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            volume_oi_ratio: 1.0,
            min_premium: 50_000.0,
            sentiment_ratio: 1.5,
            max_unusual: 10,
        }
    }
}

/// A contract with outsized session activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnusualActivity {
    pub option_type: OptionType,
    pub expiration: chrono::NaiveDate,
    pub strike: Decimal,
    pub volume: i64,
    pub open_interest: i64,
    pub premium: f64,
    /// Volume / open interest (`None` when OI is zero or missing)
    pub volume_oi_ratio: Option<f64>,
    /// Strike above spot for calls, below for puts
    pub out_of_the_money: bool,
}

/// Flow summary over a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSummary {
    pub symbol: String,
    pub call_volume: i64,
    pub put_volume: i64,
    pub call_premium: f64,
    pub put_premium: f64,
    pub put_call_volume_ratio: Option<f64>,
    pub put_call_premium_ratio: Option<f64>,
    pub sentiment: FlowSentiment,
    /// Largest premium first
    pub unusual: Vec<UnusualActivity>,
}

impl FlowSummary {
    pub fn total_premium(&self) -> f64 {
        self.call_premium + self.put_premium
    }
}

/// Options flow analyzer.
#[derive(Debug, Clone, Default)]
pub struct OptionsFlowAnalyzer {
    config: FlowConfig,
}

impl OptionsFlowAnalyzer {
    pub fn new(config: FlowConfig) -> Self {
        Self { config }
    }

    /// Analyze every expiration in the snapshot.
    pub fn analyze(&self, snapshot: &OptionsSnapshot) -> FlowSummary {
        let mut call_volume = 0;
        let mut put_volume = 0;
        let mut call_premium = 0.0;
        let mut put_premium = 0.0;
        let mut unusual = Vec::new();

        for chain in &snapshot.chains {
            for c in &chain.calls {
                call_volume += c.volume;
                call_premium += c.premium_volume();
            }
            for p in &chain.puts {
                put_volume += p.volume;
                put_premium += p.premium_volume();
            }
            unusual.extend(self.unusual_in_chain(chain, snapshot.spot_price));
        }

        unusual.sort_by(|a, b| {
            b.premium
                .partial_cmp(&a.premium)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        unusual.truncate(self.config.max_unusual);

        FlowSummary {
            symbol: snapshot.symbol.clone(),
            call_volume,
            put_volume,
            call_premium,
            put_premium,
            put_call_volume_ratio: ratio(put_volume as f64, call_volume as f64),
            put_call_premium_ratio: ratio(put_premium, call_premium),
            sentiment: self.sentiment(call_premium, put_premium),
            unusual,
        }
    }

    fn sentiment(&self, call_premium: f64, put_premium: f64) -> FlowSentiment {
        let r = self.config.sentiment_ratio;
        if call_premium > 0.0 && call_premium >= put_premium * r {
            FlowSentiment::Bullish
        } else if put_premium > 0.0 && put_premium >= call_premium * r {
            FlowSentiment::Bearish
        } else {
            FlowSentiment::Neutral
        }
    }

    fn unusual_in_chain(&self, chain: &OptionsChain, spot: Decimal) -> Vec<UnusualActivity> {
        let sides = [
            (OptionType::Call, &chain.calls),
            (OptionType::Put, &chain.puts),
        ];

        sides
            .into_iter()
            .flat_map(|(option_type, contracts)| {
                contracts
                    .iter()
                    .filter_map(move |c| self.classify(option_type, chain, c, spot))
            })
            .collect()
    }

    fn classify(
        &self,
        option_type: OptionType,
        chain: &OptionsChain,
        contract: &OptionContract,
        spot: Decimal,
    ) -> Option<UnusualActivity> {
        let oi = contract.open_interest.unwrap_or(0).max(0);
        if (contract.volume as f64) <= oi as f64 * self.config.volume_oi_ratio {
            return None;
        }

        let premium = contract.premium_volume();
        if premium < self.config.min_premium {
            return None;
        }

        Some(UnusualActivity {
            option_type,
            expiration: chain.expiration,
            strike: contract.strike,
            volume: contract.volume,
            open_interest: oi,
            premium,
            volume_oi_ratio: ratio(contract.volume as f64, oi as f64),
            out_of_the_money: match option_type {
                OptionType::Call => contract.strike > spot,
                OptionType::Put => contract.strike < spot,
            },
        })
    }
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}
