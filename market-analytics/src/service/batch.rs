//! Parallel GEX over many snapshots.
//!
//! Engines are stateless, so snapshots are fanned out across the rayon pool.
//! Output order matches input order.

use std::time::Instant;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analytics::GexSummary;
use crate::data::{OptionsSnapshot, SnapshotLoader};

use super::api::Availability;
use super::AnalyticsService;

/// GEX result for one snapshot in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub symbol: String,
    pub as_of: NaiveDate,
    pub gex: Availability<GexSummary>,
}

/// Compute GEX for every snapshot in parallel.
pub fn run_gex_batch(service: &AnalyticsService, snapshots: &[OptionsSnapshot]) -> Vec<BatchItem> {
    let start = Instant::now();

    let items: Vec<BatchItem> = snapshots
        .par_iter()
        .map(|snapshot| BatchItem {
            symbol: snapshot.symbol.clone(),
            as_of: snapshot.as_of,
            gex: service.gex_for_snapshot(snapshot),
        })
        .collect();

    let available = items.iter().filter(|i| i.gex.is_available()).count();
    info!(
        "GEX batch: {}/{} snapshots available in {:.2?}",
        available,
        items.len(),
        start.elapsed()
    );

    items
}

/// Load each symbol's snapshot for `date`, skipping symbols without data.
pub fn load_snapshots(
    loader: &SnapshotLoader,
    symbols: &[String],
    date: NaiveDate,
) -> Vec<OptionsSnapshot> {
    symbols
        .iter()
        .filter_map(|symbol| match loader.load_snapshot(symbol, date) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Skipping {} on {}: {}", symbol, date, e);
                None
            }
        })
        .collect()
}
