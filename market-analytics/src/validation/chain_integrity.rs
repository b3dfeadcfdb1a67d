//! Data integrity checks for options-chain snapshots.
//!
//! Validates:
//! - Spot price (positive)
//! - Chain coverage (both calls and puts present)
//! - Strikes (positive)
//! - Open interest and gamma coverage (missing values are skipped by GEX)
//! - Volume and open interest (non-negative)
//! - Expirations (not before the snapshot date)
//! - Greeks ranges (delta in [-1,1], vega >= 0)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::data::{OptionContract, OptionsSnapshot};

/// Share of contracts allowed to miss OI or gamma before the check fails.
const MAX_MISSING_PCT: f64 = 50.0;

/// Result of a single validation check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
}

impl CheckResult {
    pub fn pass(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn fail(name: &str, message: &str, details: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: message.to_string(),
            details,
        }
    }
}

/// Integrity report for one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainIntegrityReport {
    pub symbol: String,
    pub contract_count: usize,
    pub expiration_count: usize,
    /// Contracts the GEX engine will skip (missing OI or gamma)
    pub gex_skipped: usize,
    pub checks: Vec<CheckResult>,
}

impl ChainIntegrityReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failed_checks(&self) -> Vec<&CheckResult> {
        self.checks.iter().filter(|c| !c.passed).collect()
    }

    pub fn summary(&self) -> String {
        let passed = self.checks.iter().filter(|c| c.passed).count();
        format!(
            "{} ({} contracts, {} expirations, {} skipped for GEX): {}/{} checks passed",
            self.symbol,
            self.contract_count,
            self.expiration_count,
            self.gex_skipped,
            passed,
            self.checks.len()
        )
    }
}

/// Validator for chain snapshots.
#[derive(Debug, Default)]
pub struct ChainIntegrityValidator;

impl ChainIntegrityValidator {
    pub fn new() -> Self {
        Self
    }

    /// Run all checks on a snapshot.
    pub fn validate(&self, snapshot: &OptionsSnapshot) -> ChainIntegrityReport {
        let contracts: Vec<&OptionContract> = snapshot
            .chains
            .iter()
            .flat_map(|c| c.calls.iter().chain(c.puts.iter()))
            .collect();

        let checks = vec![
            self.check_spot(snapshot),
            self.check_coverage(snapshot),
            self.check_strikes(&contracts),
            self.check_missing(
                "open_interest_coverage",
                "open interest",
                &contracts,
                |c| c.open_interest.is_none(),
            ),
            self.check_missing("gamma_coverage", "gamma", &contracts, |c| c.gamma.is_none()),
            self.check_counts(&contracts),
            self.check_expirations(snapshot),
            self.check_greeks(&contracts),
        ];

        ChainIntegrityReport {
            symbol: snapshot.symbol.clone(),
            contract_count: contracts.len(),
            expiration_count: snapshot.chains.len(),
            gex_skipped: contracts.iter().filter(|c| c.gex_inputs().is_none()).count(),
            checks,
        }
    }

    fn check_spot(&self, snapshot: &OptionsSnapshot) -> CheckResult {
        if snapshot.spot_price > Decimal::ZERO {
            CheckResult::pass("spot_price", &format!("Spot {}", snapshot.spot_price))
        } else {
            CheckResult::fail(
                "spot_price",
                "Spot price must be positive",
                Some(format!("spot = {}", snapshot.spot_price)),
            )
        }
    }

    fn check_coverage(&self, snapshot: &OptionsSnapshot) -> CheckResult {
        let calls: usize = snapshot.chains.iter().map(|c| c.calls.len()).sum();
        let puts: usize = snapshot.chains.iter().map(|c| c.puts.len()).sum();

        if calls > 0 && puts > 0 {
            CheckResult::pass(
                "chain_coverage",
                &format!("{} calls, {} puts", calls, puts),
            )
        } else {
            CheckResult::fail(
                "chain_coverage",
                "Both calls and puts are required",
                Some(format!("{} calls, {} puts", calls, puts)),
            )
        }
    }

    fn check_strikes(&self, contracts: &[&OptionContract]) -> CheckResult {
        let invalid = contracts
            .iter()
            .filter(|c| c.strike <= Decimal::ZERO)
            .count();
        if invalid == 0 {
            CheckResult::pass("strike_validity", "All strikes positive")
        } else {
            CheckResult::fail(
                "strike_validity",
                &format!("{} contracts with non-positive strike", invalid),
                None,
            )
        }
    }

    fn check_missing(
        &self,
        name: &str,
        field: &str,
        contracts: &[&OptionContract],
        is_missing: impl Fn(&OptionContract) -> bool,
    ) -> CheckResult {
        let missing = contracts.iter().filter(|&&c| is_missing(c)).count();
        if missing == 0 {
            return CheckResult::pass(name, &format!("All contracts have {}", field));
        }

        let pct = missing as f64 / contracts.len() as f64 * 100.0;
        let message = format!("{} ({:.1}%) contracts missing {}", missing, pct, field);
        if pct > MAX_MISSING_PCT {
            CheckResult::fail(name, &message, None)
        } else {
            CheckResult::pass(name, &message)
        }
    }

    fn check_counts(&self, contracts: &[&OptionContract]) -> CheckResult {
        let negative_volume = contracts.iter().filter(|c| c.volume < 0).count();
        let negative_oi = contracts
            .iter()
            .filter(|c| c.open_interest.is_some_and(|oi| oi < 0))
            .count();

        if negative_volume == 0 && negative_oi == 0 {
            CheckResult::pass("count_validity", "Volume and open interest non-negative")
        } else {
            CheckResult::fail(
                "count_validity",
                "Negative counts found",
                Some(format!(
                    "volume: {}, open interest: {}",
                    negative_volume, negative_oi
                )),
            )
        }
    }

    fn check_expirations(&self, snapshot: &OptionsSnapshot) -> CheckResult {
        let expired: Vec<String> = snapshot
            .chains
            .iter()
            .filter(|c| c.expiration < snapshot.as_of)
            .map(|c| c.expiration.to_string())
            .collect();

        if expired.is_empty() {
            CheckResult::pass("expiration_validity", "No expired chains")
        } else {
            CheckResult::fail(
                "expiration_validity",
                &format!("{} chains expired before {}", expired.len(), snapshot.as_of),
                Some(expired.join(", ")),
            )
        }
    }

    fn check_greeks(&self, contracts: &[&OptionContract]) -> CheckResult {
        let mut issues = Vec::new();

        let invalid_delta = contracts
            .iter()
            .filter(|c| c.delta.is_some_and(|d| !(-1.0..=1.0).contains(&d)))
            .count();
        if invalid_delta > 0 {
            issues.push(format!("{} contracts with delta outside [-1,1]", invalid_delta));
        }

        let invalid_vega = contracts
            .iter()
            .filter(|c| c.vega.is_some_and(|v| v < 0.0))
            .count();
        if invalid_vega > 0 {
            issues.push(format!("{} contracts with negative vega", invalid_vega));
        }

        if issues.is_empty() {
            CheckResult::pass("greeks_validity", "Greeks within valid ranges")
        } else {
            CheckResult::fail(
                "greeks_validity",
                &format!("{} issues found", issues.len()),
                Some(issues.join("; ")),
            )
        }
    }
}
