//! Snapshot loader for stored options chains.
//!
//! Chains captured by the quote-fetch layer are stored as Parquet, one file
//! per symbol and year, with one row per contract:
//! - symbol, trade_date, expir_date, strike, option_type, stock_price
//! - last, volume, open_interest
//! - implied_volatility, delta, gamma, theta, vega
//!
//! Greek and open-interest columns are nullable; nulls stay `None` on the
//! contract so the engines can skip them. JSON request files are read with
//! [`load_json`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::types::{OptionContract, OptionType, OptionsChain, OptionsSnapshot};

/// Expected columns in the parquet files.
pub const EXPECTED_COLUMNS: &[&str] = &[
    "symbol",
    "trade_date",
    "expir_date",
    "strike",
    "option_type",
    "stock_price",
    "last",
    "volume",
    "open_interest",
    "implied_volatility",
    "delta",
    "gamma",
    "theta",
    "vega",
];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LoaderResult<T> = Result<T, LoaderError>;

/// Read a JSON document (request, snapshot, history) from disk.
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> LoaderResult<T> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoaderError::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| LoaderError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Parquet loader for stored chain snapshots.
pub struct SnapshotLoader {
    data_dir: PathBuf,
}

impl SnapshotLoader {
    /// Create a loader rooted at the snapshot data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Path to a symbol's parquet file for a given year.
    fn parquet_path(&self, symbol: &str, year: i32) -> PathBuf {
        self.data_dir
            .join("chains")
            .join(symbol)
            .join(format!("{}_{}.parquet", symbol, year))
    }

    /// List symbols that have stored chains.
    pub fn available_symbols(&self) -> LoaderResult<Vec<String>> {
        let path = self.data_dir.join("chains");
        if !path.exists() {
            return Ok(vec![]);
        }

        let mut symbols = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                symbols.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        symbols.sort();
        Ok(symbols)
    }

    /// Scan a symbol's file for one year.
    pub fn load_lazy(&self, symbol: &str, year: i32) -> LoaderResult<LazyFrame> {
        let path = self.parquet_path(symbol, year);
        if !path.exists() {
            return Err(LoaderError::FileNotFound(path.display().to_string()));
        }
        let lf = LazyFrame::scan_parquet(&path, ScanArgsParquet::default())?;
        Ok(lf)
    }

    /// Load the snapshot for a symbol on a trading date.
    pub fn load_snapshot(&self, symbol: &str, date: NaiveDate) -> LoaderResult<OptionsSnapshot> {
        let df = self
            .load_lazy(symbol, date.year())?
            .filter(col("trade_date").eq(lit(date.to_string())))
            .collect()?;

        if df.height() == 0 {
            return Err(LoaderError::InvalidData(format!(
                "No data for {} on {}",
                symbol, date
            )));
        }

        dataframe_to_snapshot(&df, symbol, date)
    }

    /// Load the latest stored snapshot for a symbol in a year.
    pub fn load_latest(&self, symbol: &str, year: i32) -> LoaderResult<OptionsSnapshot> {
        let stats = self
            .load_lazy(symbol, year)?
            .select([col("trade_date").max().alias("max_date")])
            .collect()?;

        let max_str = stats
            .column("max_date")?
            .str()?
            .get(0)
            .ok_or_else(|| LoaderError::InvalidData(format!("No rows for {}", symbol)))?;
        let date = NaiveDate::parse_from_str(max_str, "%Y-%m-%d")
            .map_err(|e| LoaderError::InvalidData(format!("Invalid trade date: {}", e)))?;

        self.load_snapshot(symbol, date)
    }
}

fn decimal(value: Option<f64>) -> Option<Decimal> {
    value.and_then(Decimal::from_f64_retain).map(|d| d.round_dp(6))
}

/// Convert one day's rows into a snapshot grouped by expiration.
fn dataframe_to_snapshot(
    df: &DataFrame,
    symbol: &str,
    date: NaiveDate,
) -> LoaderResult<OptionsSnapshot> {
    let stock_col = df.column("stock_price")?.f64()?;
    let spot = decimal(stock_col.get(0)).unwrap_or_default();

    let expir_col = df.column("expir_date")?.str()?;
    let strike_col = df.column("strike")?.f64()?;
    let type_col = df.column("option_type")?.str()?;
    let last_col = df.column("last")?.f64()?;
    let volume_col = df.column("volume")?.i64()?;
    let oi_col = df.column("open_interest")?.i64()?;
    let iv_col = df.column("implied_volatility")?.f64()?;
    let delta_col = df.column("delta")?.f64()?;
    let gamma_col = df.column("gamma")?.f64()?;
    let theta_col = df.column("theta")?.f64()?;
    let vega_col = df.column("vega")?.f64()?;

    let mut chains: BTreeMap<NaiveDate, OptionsChain> = BTreeMap::new();

    for idx in 0..df.height() {
        let Some(expiration) = expir_col
            .get(idx)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        else {
            continue;
        };
        let Some(option_type) = type_col.get(idx).and_then(OptionType::from_str) else {
            continue;
        };
        let Some(strike) = decimal(strike_col.get(idx)) else {
            continue;
        };

        let contract = OptionContract {
            strike,
            option_type: Some(option_type),
            open_interest: oi_col.get(idx),
            volume: volume_col.get(idx).unwrap_or(0),
            last: decimal(last_col.get(idx)).unwrap_or_default(),
            implied_volatility: iv_col.get(idx),
            delta: delta_col.get(idx),
            gamma: gamma_col.get(idx),
            theta: theta_col.get(idx),
            vega: vega_col.get(idx),
        };

        chains
            .entry(expiration)
            .or_insert_with(|| OptionsChain::new(expiration))
            .add_contract(option_type, contract);
    }

    let mut snapshot = OptionsSnapshot::new(symbol, date, spot);
    snapshot.chains = chains.into_values().collect();
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parquet_path() {
        let loader = SnapshotLoader::new("data");
        let path = loader.parquet_path("SPY", 2024);
        assert_eq!(path, PathBuf::from("data/chains/SPY/SPY_2024.parquet"));
    }

    #[test]
    fn test_missing_file() {
        let loader = SnapshotLoader::new("does/not/exist");
        let err = loader.load_lazy("SPY", 2024).err().expect("expected an error");
        assert!(matches!(err, LoaderError::FileNotFound(_)));
        assert!(loader.available_symbols().unwrap().is_empty());
    }

    #[test]
    fn test_load_json_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(
            &path,
            r#"{"symbol": "SPY", "asOf": "2024-03-01", "spotPrice": 510.25,
                "chains": [{"expiration": "2024-03-08",
                            "calls": [{"strike": 510, "openInterest": 100, "gamma": 0.02}],
                            "puts": []}]}"#,
        )
        .unwrap();

        let snapshot: OptionsSnapshot = load_json(&path).unwrap();
        assert_eq!(snapshot.symbol, "SPY");
        assert_eq!(snapshot.spot_price, dec!(510.25));
        assert_eq!(snapshot.chains.len(), 1);
        assert_eq!(snapshot.chains[0].calls[0].strike, dec!(510));
    }

    #[test]
    fn test_load_json_reports_path_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = load_json::<OptionsSnapshot>(&path).unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn test_load_snapshot_from_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let symbol_dir = dir.path().join("chains").join("SPY");
        std::fs::create_dir_all(&symbol_dir).unwrap();

        let mut df = df!(
            "symbol" => ["SPY", "SPY", "SPY"],
            "trade_date" => ["2024-03-01", "2024-03-01", "2024-02-29"],
            "expir_date" => ["2024-03-08", "2024-03-08", "2024-03-08"],
            "strike" => [510.0, 505.0, 500.0],
            "option_type" => ["C", "P", "C"],
            "stock_price" => [510.0, 510.0, 508.0],
            "last" => [3.2, 2.1, 9.0],
            "volume" => [1500i64, 900, 10],
            "open_interest" => [Some(12_000i64), None, Some(5)],
            "implied_volatility" => [Some(0.14), Some(0.15), None],
            "delta" => [Some(0.5), Some(-0.35), None],
            "gamma" => [Some(0.03), None, Some(0.01)],
            "theta" => [Some(-0.4), Some(-0.3), None],
            "vega" => [Some(0.2), Some(0.18), None]
        )
        .unwrap();
        let file = std::fs::File::create(symbol_dir.join("SPY_2024.parquet")).unwrap();
        ParquetWriter::new(file).finish(&mut df).unwrap();

        let loader = SnapshotLoader::new(dir.path());
        assert_eq!(loader.available_symbols().unwrap(), vec!["SPY".to_string()]);

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let snapshot = loader.load_snapshot("SPY", date).unwrap();
        assert_eq!(snapshot.spot_price, dec!(510));
        assert_eq!(snapshot.total_contracts(), 2);

        let chain = &snapshot.chains[0];
        assert_eq!(chain.calls[0].open_interest, Some(12_000));
        assert_eq!(chain.puts[0].open_interest, None);
        assert_eq!(chain.puts[0].gamma, None);

        let latest = loader.load_latest("SPY", 2024).unwrap();
        assert_eq!(latest.as_of, date);
    }
}
