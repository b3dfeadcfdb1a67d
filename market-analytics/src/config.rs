//! Analytics configuration.
//!
//! Every section has defaults, so a TOML file only needs the keys it
//! overrides:
//!
//! ```toml
//! [gex]
//! window_pct = 0.08
//! allowed_symbols = ["SPY", "QQQ"]
//!
//! [implied_move]
//! edge_threshold_pct = 1.5
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analytics::{FlowConfig, GexConfig, ImpliedMoveConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value: {0}")]
    Invalid(String),
}

/// Top-level configuration for all engines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub gex: GexConfig,
    pub implied_move: ImpliedMoveConfig,
    pub flow: FlowConfig,
}

impl AnalyticsConfig {
    /// Load from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engines cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.gex.window_pct > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "gex.window_pct must be positive, got {}",
                self.gex.window_pct
            )));
        }
        if self.gex.flip_tolerance_pct < 0.0 {
            return Err(ConfigError::Invalid(
                "gex.flip_tolerance_pct must be non-negative".to_string(),
            ));
        }
        if !(self.gex.contract_multiplier > 0.0) {
            return Err(ConfigError::Invalid(
                "gex.contract_multiplier must be positive".to_string(),
            ));
        }
        if self.implied_move.horizon_days < 0 {
            return Err(ConfigError::Invalid(
                "implied_move.horizon_days must be non-negative".to_string(),
            ));
        }
        if self.implied_move.edge_threshold_pct < 0.0 {
            return Err(ConfigError::Invalid(
                "implied_move.edge_threshold_pct must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalyticsConfig::default();
        assert_eq!(config.gex.window_pct, 0.10);
        assert_eq!(config.gex.max_key_levels, 6);
        assert_eq!(config.gex.flip_tolerance_pct, 0.005);
        assert_eq!(config.implied_move.horizon_days, 14);
        assert_eq!(config.implied_move.edge_threshold_pct, 1.0);
        assert_eq!(config.implied_move.max_history, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnalyticsConfig::from_toml(
            r#"
            [gex]
            window_pct = 0.08
            allowed_symbols = ["SPY"]

            [implied_move]
            edge_threshold_pct = 1.5
            "#,
        )
        .unwrap();

        assert_eq!(config.gex.window_pct, 0.08);
        assert_eq!(config.gex.max_key_levels, 6);
        assert_eq!(config.gex.allowed_symbols, Some(vec!["SPY".to_string()]));
        assert_eq!(config.implied_move.edge_threshold_pct, 1.5);
        assert_eq!(config.implied_move.horizon_days, 14);
        assert_eq!(config.flow, FlowConfig::default());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(AnalyticsConfig::from_toml("").unwrap(), AnalyticsConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = AnalyticsConfig::from_toml("[gex]\nwindow_pct = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = AnalyticsConfig::from_toml("[implied_move]\nhorizon_days = -1").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = AnalyticsConfig::from_toml("[gex\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics.toml");
        std::fs::write(&path, "[flow]\nmin_premium = 25000.0\n").unwrap();

        let config = AnalyticsConfig::from_file(&path).unwrap();
        assert_eq!(config.flow.min_premium, 25_000.0);

        let missing = AnalyticsConfig::from_file(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::NotFound(_)));
    }
}
