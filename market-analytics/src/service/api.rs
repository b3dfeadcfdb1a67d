//! Request and response shapes for the analytics boundary.
//!
//! Responses are either the summary itself or `{"available": false}`, so
//! callers can hide a panel without treating it as an error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::data::{HistoricalMove, OptionContract};

/// GEX request: one chain snapshot, calls and puts flattened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GexRequest {
    pub symbol: String,
    pub spot_price: Decimal,
    #[serde(default)]
    pub calls: Vec<OptionContract>,
    #[serde(default)]
    pub puts: Vec<OptionContract>,
}

/// Implied move request with an already-selected straddle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpliedMoveRequest {
    pub symbol: String,
    pub spot_price: Decimal,
    pub atm_call: OptionContract,
    pub atm_put: OptionContract,
    pub days_to_earnings: i64,
    #[serde(default)]
    pub historical_moves: Vec<HistoricalMove>,
}

/// Marker body for a not-applicable result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unavailable {
    pub available: bool,
}

impl Default for Unavailable {
    fn default() -> Self {
        Self { available: false }
    }
}

/// A summary, or `{"available": false}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Availability<T> {
    Available(T),
    Unavailable(Unavailable),
}

impl<T> Availability<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Available(v) => Some(v),
            Self::Unavailable(_) => None,
        }
    }
}

impl<T> From<Option<T>> for Availability<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Available(v),
            None => Self::Unavailable(Unavailable::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_serialization() {
        let response: Availability<u32> = None.into();
        assert!(!response.is_available());
        assert_eq!(serde_json::to_string(&response).unwrap(), r#"{"available":false}"#);
    }

    #[test]
    fn test_available_is_transparent() {
        let response: Availability<u32> = Some(7).into();
        assert!(response.is_available());
        assert_eq!(serde_json::to_string(&response).unwrap(), "7");
        assert_eq!(response.into_option(), Some(7));
    }

    #[test]
    fn test_gex_request_parsing() {
        let json = r#"{
            "symbol": "SPY",
            "spotPrice": 512.3,
            "calls": [{"strike": 515, "openInterest": 4000, "gamma": 0.021}],
            "puts": [{"strike": 505, "openInterest": 6100}]
        }"#;
        let request: GexRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.symbol, "SPY");
        assert_eq!(request.calls.len(), 1);
        assert_eq!(request.puts[0].gamma, None);
    }
}
