//! Market analytics CLI
//!
//! Runs the analytics engines over JSON requests or stored Parquet chains
//! and prints pretty JSON to stdout.
//!
//! # Usage
//!
//! ```bash
//! # Gamma exposure for one chain snapshot
//! market-analytics gex --input requests/spy_gex.json
//!
//! # Earnings implied move with overridden thresholds
//! market-analytics --config config/analytics.toml implied-move --input requests/nvda.json
//!
//! # Flow and data quality for a full snapshot
//! market-analytics flow --input snapshots/spy.json
//! market-analytics validate --input snapshots/spy.json
//!
//! # GEX for several symbols from stored Parquet chains
//! market-analytics batch --data data --symbols SPY,QQQ,IWM --date 2024-06-03
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use market_analytics::config::AnalyticsConfig;
use market_analytics::data::{load_json, OptionsSnapshot, SnapshotLoader};
use market_analytics::service::{
    load_snapshots, run_gex_batch, AnalyticsService, GexRequest, ImpliedMoveRequest,
};

#[derive(Parser)]
#[command(name = "market-analytics")]
#[command(about = "Gamma exposure, implied move and options flow analytics")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Dealer gamma exposure for a GEX request
    Gex {
        /// Path to request JSON ({ symbol, spotPrice, calls, puts })
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Earnings implied move for an implied-move request
    ImpliedMove {
        /// Path to implied-move request JSON
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Options flow summary for a chain snapshot
    Flow {
        /// Path to snapshot JSON
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Data integrity checks for a chain snapshot
    Validate {
        /// Path to snapshot JSON
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Parallel GEX over stored Parquet chains
    Batch {
        /// Path to data directory
        #[arg(short, long, default_value = "data")]
        data: PathBuf,

        /// Comma-separated list of symbols
        #[arg(long, default_value = "SPY,QQQ,IWM")]
        symbols: String,

        /// Trade date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<AnalyticsConfig> {
    match path {
        Some(p) => AnalyticsConfig::from_file(p)
            .with_context(|| format!("Failed to load config {}", p.display())),
        None => Ok(AnalyticsConfig::default()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("market_analytics=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let service = AnalyticsService::new(load_config(cli.config.as_ref())?);

    match cli.command {
        Commands::Gex { input } => {
            let request: GexRequest = load_json(&input)
                .with_context(|| format!("Failed to read GEX request {}", input.display()))?;
            print_json(&service.handle_gex(&request))?;
        }
        Commands::ImpliedMove { input } => {
            let request: ImpliedMoveRequest = load_json(&input).with_context(|| {
                format!("Failed to read implied-move request {}", input.display())
            })?;
            print_json(&service.handle_implied_move(&request))?;
        }
        Commands::Flow { input } => {
            let snapshot: OptionsSnapshot = load_json(&input)
                .with_context(|| format!("Failed to read snapshot {}", input.display()))?;
            print_json(&service.flow(&snapshot))?;
        }
        Commands::Validate { input } => {
            let snapshot: OptionsSnapshot = load_json(&input)
                .with_context(|| format!("Failed to read snapshot {}", input.display()))?;
            let report = service.validate(&snapshot);
            if report.all_passed() {
                info!("{}", report.summary());
            } else {
                warn!("{}", report.summary());
            }
            print_json(&report)?;
        }
        Commands::Batch {
            data,
            symbols,
            date,
        } => {
            let date =
                NaiveDate::parse_from_str(&date, "%Y-%m-%d").context("Invalid date format")?;
            let symbol_list: Vec<String> = symbols
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();

            let loader = SnapshotLoader::new(data);
            let snapshots = load_snapshots(&loader, &symbol_list, date);
            info!("Loaded {}/{} snapshots for {}", snapshots.len(), symbol_list.len(), date);

            print_json(&run_gex_batch(&service, &snapshots))?;
        }
    }

    Ok(())
}
