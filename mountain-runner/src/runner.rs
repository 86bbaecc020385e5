//! Day runner: wires loading, replay and fingerprinting together.
//!
//! Two entry points:
//! - `run_day()`: loads one CSV day file, then replays it. Used by the CLI.
//! - `run_days()`: the same over many files, in parallel on the rayon pool.
//!
//! `run_series()` is the I/O-free core both of them share.

use chrono::NaiveDate;
use mountain_core::{
    replay, CandleSeries, ContentHash, ReplayError, ReplayResult, RunFingerprint, StrategyConfig,
    TradeSummary,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::data_loader::{load_day, LoadError};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("replay of {day} failed: {source}")]
    Replay {
        day: String,
        #[source]
        source: ReplayError,
    },
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of one replayed day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub day: String,
    pub instrument: String,
    pub trading_date: Option<NaiveDate>,
    pub config: StrategyConfig,
    pub fingerprint: RunFingerprint,
    pub result: ReplayResult,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Replay an in-memory series. No I/O.
pub fn run_series(day: &str, series: &CandleSeries, config: &RunConfig) -> Result<DayResult, RunError> {
    run_hashed(day, series, ContentHash::of(series), config)
}

/// Load and replay one day file. The fingerprint reuses the hash taken at load time.
pub fn run_day(path: &Path, config: &RunConfig) -> Result<DayResult, RunError> {
    let loaded = load_day(path)?;
    run_hashed(&loaded.name, &loaded.series, loaded.dataset_hash, config)
}

fn run_hashed(
    day: &str,
    series: &CandleSeries,
    dataset_hash: ContentHash,
    config: &RunConfig,
) -> Result<DayResult, RunError> {
    let result = replay(series, &config.strategy).map_err(|source| RunError::Replay {
        day: day.to_string(),
        source,
    })?;

    for warning in &result.warnings {
        warn!(day, %warning, "data quality");
    }
    info!(
        day,
        bars = result.bar_count,
        signals = result.signals.len(),
        trades = result.summary.trade_count,
        pnl = result.summary.total_pnl,
        "day replayed"
    );

    Ok(DayResult {
        schema_version: SCHEMA_VERSION,
        day: day.to_string(),
        instrument: config.run.instrument.clone(),
        trading_date: series.trading_date(),
        config: config.strategy.clone(),
        fingerprint: RunFingerprint::with_dataset_hash(dataset_hash, &config.strategy, &result.events),
        result,
    })
}

/// Replay many day files in parallel. Output order matches input order; one
/// failing day does not stop the others.
pub fn run_days(paths: &[PathBuf], config: &RunConfig) -> Vec<(PathBuf, Result<DayResult, RunError>)> {
    paths
        .par_iter()
        .map(|path| (path.clone(), run_day(path, config)))
        .collect()
}

/// Totals over every trade of every successful day.
pub fn aggregate(days: &[DayResult]) -> TradeSummary {
    let history: Vec<_> = days
        .iter()
        .flat_map(|d| d.result.history.iter().cloned())
        .collect();
    TradeSummary::compute(&history)
}
