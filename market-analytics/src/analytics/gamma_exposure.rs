//! Dealer gamma exposure (GEX) by strike.
//!
//! Aggregates `OI * gamma * 100 * spot` per strike, with calls counted as
//! dealer long gamma (positive) and puts as dealer short gamma (negative):
//! - Pinned: total GEX >= 0, dealer hedging dampens moves
//! - Volatile: total GEX < 0, dealer hedging amplifies moves
//!
//! Key levels are the largest-magnitude strikes within a window around spot,
//! tagged support/resistance, plus the flip strike where GEX changes sign.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::{OptionContract, CONTRACT_MULTIPLIER};

/// Aggregate dealer gamma regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GammaRegime {
    /// Net long gamma, price tends to pin near large strikes.
    Pinned,
    /// Net short gamma, moves tend to extend.
    Volatile,
}

impl GammaRegime {
    pub fn from_total(total_gex: f64) -> Self {
        if total_gex >= 0.0 {
            Self::Pinned
        } else {
            Self::Volatile
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Pinned => "Dealers long gamma, volatility dampened",
            Self::Volatile => "Dealers short gamma, volatility amplified",
        }
    }
}

/// Role of a key strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelType {
    Support,
    Resistance,
    Flip,
}

/// One key strike on the GEX surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GexLevel {
    pub strike: Decimal,
    /// Net GEX dollars at the strike (0 for a synthesized flip level)
    pub gex: f64,
    #[serde(rename = "type")]
    pub level_type: LevelType,
}

/// Net GEX at a single strike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrikeGex {
    pub strike: Decimal,
    pub gex: f64,
}

/// Result of a GEX computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GexSummary {
    pub symbol: String,
    pub spot_price: Decimal,
    pub total_gex: f64,
    pub flip_level: Decimal,
    pub regime: GammaRegime,
    /// Ascending by strike
    pub key_levels: Vec<GexLevel>,
    /// Windowed per-strike GEX, ascending by strike
    pub profile: Vec<StrikeGex>,
}

impl GexSummary {
    pub fn supports(&self) -> impl Iterator<Item = &GexLevel> {
        self.key_levels
            .iter()
            .filter(|l| l.level_type == LevelType::Support)
    }

    pub fn resistances(&self) -> impl Iterator<Item = &GexLevel> {
        self.key_levels
            .iter()
            .filter(|l| l.level_type == LevelType::Resistance)
    }
}

/// Decides which symbols get GEX treatment.
pub trait SymbolFilter: Send + Sync {
    fn allows(&self, symbol: &str) -> bool;
}

impl<F> SymbolFilter for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn allows(&self, symbol: &str) -> bool {
        self(symbol)
    }
}

/// Case-insensitive symbol allow-list.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    symbols: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            symbols: symbols
                .into_iter()
                .map(|s| s.as_ref().trim().to_uppercase())
                .collect(),
        }
    }
}

impl SymbolFilter for AllowList {
    fn allows(&self, symbol: &str) -> bool {
        self.symbols.contains(&symbol.trim().to_uppercase())
    }
}

/// GEX engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GexConfig {
    /// Strikes further than this fraction of spot are excluded from key levels.
    pub window_pct: f64,
    /// Number of key levels to report.
    pub max_key_levels: usize,
    /// Key levels within this fraction of the flip strike are tagged flip.
    pub flip_tolerance_pct: f64,
    /// Shares per contract.
    pub contract_multiplier: f64,
    /// Symbols eligible for GEX. `None` or an empty list accepts every symbol.
    pub allowed_symbols: Option<Vec<String>>,
}

impl Default for GexConfig {
    fn default() -> Self {
        Self {
            window_pct: 0.10,
            max_key_levels: 6,
            flip_tolerance_pct: 0.005,
            contract_multiplier: CONTRACT_MULTIPLIER,
            allowed_symbols: Some(
                ["SPY", "QQQ", "IWM", "DIA", "SPX", "NDX"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
        }
    }
}

/// Gamma exposure engine.
#[derive(Clone)]
pub struct GammaExposureEngine {
    config: GexConfig,
    filter: Option<Arc<dyn SymbolFilter>>,
}

impl Default for GammaExposureEngine {
    fn default() -> Self {
        Self::new(GexConfig::default())
    }
}

impl GammaExposureEngine {
    /// Build an engine; the symbol filter comes from `config.allowed_symbols`.
    pub fn new(config: GexConfig) -> Self {
        let filter = config
            .allowed_symbols
            .as_ref()
            .filter(|list| !list.is_empty())
            .map(|list| Arc::new(AllowList::new(list)) as Arc<dyn SymbolFilter>);
        Self { config, filter }
    }

    /// Replace the symbol filter with an injected predicate.
    pub fn with_filter(mut self, filter: impl SymbolFilter + 'static) -> Self {
        self.filter = Some(Arc::new(filter) as Arc<dyn SymbolFilter>);
        self
    }

    /// Accept every symbol.
    pub fn without_filter(mut self) -> Self {
        self.filter = None;
        self
    }

    pub fn config(&self) -> &GexConfig {
        &self.config
    }

    pub fn allows(&self, symbol: &str) -> bool {
        self.filter.as_ref().map_or(true, |f| f.allows(symbol))
    }

    /// Compute the GEX summary, or `None` when the inputs cannot support one.
    pub fn compute_gex(
        &self,
        symbol: &str,
        spot_price: Decimal,
        calls: &[OptionContract],
        puts: &[OptionContract],
    ) -> Option<GexSummary> {
        if calls.is_empty() || puts.is_empty() {
            debug!(symbol, "GEX not applicable: empty chain side");
            return None;
        }
        if spot_price <= Decimal::ZERO {
            debug!(symbol, %spot_price, "GEX not applicable: non-positive spot");
            return None;
        }
        if !self.allows(symbol) {
            debug!(symbol, "GEX not applicable: symbol filtered out");
            return None;
        }

        let by_strike = self.gex_by_strike(spot_price, calls, puts);
        if by_strike.is_empty() {
            debug!(symbol, "GEX not applicable: no contract with OI and gamma");
            return None;
        }

        let total_gex: f64 = by_strike.values().sum();
        let regime = GammaRegime::from_total(total_gex);

        let profile: Vec<StrikeGex> = by_strike
            .iter()
            .filter(|(strike, _)| self.in_window(**strike, spot_price))
            .map(|(strike, gex)| StrikeGex {
                strike: *strike,
                gex: *gex,
            })
            .collect();

        let flip_level = find_flip_level(&by_strike).unwrap_or(spot_price);
        let key_levels = self.key_levels(&profile, flip_level, spot_price);

        Some(GexSummary {
            symbol: symbol.to_string(),
            spot_price,
            total_gex,
            flip_level,
            regime,
            key_levels,
            profile,
        })
    }

    /// Net GEX per strike across both sides of the chain.
    pub fn gex_by_strike(
        &self,
        spot_price: Decimal,
        calls: &[OptionContract],
        puts: &[OptionContract],
    ) -> BTreeMap<Decimal, f64> {
        let mut by_strike: BTreeMap<Decimal, f64> = BTreeMap::new();
        let spot: f64 = spot_price.try_into().unwrap_or(0.0);
        let scale = self.config.contract_multiplier * spot;

        let sides = [(calls, 1.0), (puts, -1.0)];
        for (contracts, sign) in sides {
            for contract in contracts {
                if let Some((oi, gamma)) = contract.gex_inputs() {
                    *by_strike.entry(contract.strike).or_insert(0.0) +=
                        oi as f64 * gamma * scale * sign;
                }
            }
        }

        by_strike
    }

    fn in_window(&self, strike: Decimal, spot_price: Decimal) -> bool {
        (strike - spot_price).abs() <= spot_price * decimal_or_zero(self.config.window_pct)
    }

    /// Top strikes by |GEX|, tagged and sorted ascending.
    ///
    /// A flip level away from spot that is not already listed gets a
    /// synthesized `gex = 0` entry.
    fn key_levels(
        &self,
        profile: &[StrikeGex],
        flip_level: Decimal,
        spot_price: Decimal,
    ) -> Vec<GexLevel> {
        let mut ranked: Vec<&StrikeGex> = profile.iter().collect();
        ranked.sort_by(|a, b| {
            b.gex
                .abs()
                .partial_cmp(&a.gex.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(self.config.max_key_levels);

        let tolerance = flip_level.abs() * decimal_or_zero(self.config.flip_tolerance_pct);
        let near_flip = |strike: Decimal| (strike - flip_level).abs() <= tolerance;

        let mut levels: Vec<GexLevel> = ranked
            .into_iter()
            .map(|s| {
                let level_type = if near_flip(s.strike) {
                    LevelType::Flip
                } else if s.gex > 0.0 {
                    LevelType::Resistance
                } else {
                    LevelType::Support
                };
                GexLevel {
                    strike: s.strike,
                    gex: s.gex,
                    level_type,
                }
            })
            .collect();

        if flip_level != spot_price && !levels.iter().any(|l| l.strike == flip_level) {
            levels.push(GexLevel {
                strike: flip_level,
                gex: 0.0,
                level_type: LevelType::Flip,
            });
        }

        levels.sort_by_key(|l| l.strike);
        levels
    }
}

fn decimal_or_zero(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or_default()
}

/// First strike (ascending) whose GEX sign differs from the strike below it.
///
/// Zero counts as non-negative.
pub fn find_flip_level(by_strike: &BTreeMap<Decimal, f64>) -> Option<Decimal> {
    by_strike
        .iter()
        .zip(by_strike.iter().skip(1))
        .find(|((_, prev), (_, cur))| (**prev < 0.0) != (**cur < 0.0))
        .map(|(_, (strike, _))| *strike)
}
