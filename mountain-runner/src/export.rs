//! Result export: JSON and CSV artifact generation.
//!
//! Three formats per day:
//! - **JSON**: the whole `DayResult`, round-trippable, with schema versioning
//! - **events CSV**: the event log, one row per event
//! - **trades CSV**: the reconciled trade history
//!
//! Unknown (newer) schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use mountain_core::{EventKind, EventLog, TradeRecord};

use crate::runner::{DayResult, SCHEMA_VERSION};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `DayResult` to pretty JSON.
pub fn export_json(result: &DayResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize DayResult to JSON")
}

/// Deserialize a `DayResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<DayResult> {
    let result: DayResult =
        serde_json::from_str(json).context("failed to deserialize DayResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the event log as CSV.
///
/// Columns: index, time, side, type, price, signal_index, high, low, rsi, reason.
/// Cells that do not apply to an event type are left blank.
pub fn export_events_csv(events: &EventLog) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "index",
        "time",
        "side",
        "type",
        "price",
        "signal_index",
        "high",
        "low",
        "rsi",
        "reason",
    ])?;

    for event in events {
        let (high, low, rsi, reason) = match &event.kind {
            EventKind::Signal { high, low, rsi } => (Some(*high), Some(*low), *rsi, ""),
            EventKind::IgnoredSignal {
                high,
                low,
                rsi,
                reason,
            } => (Some(*high), Some(*low), *rsi, reason.as_str()),
            _ => (None, None, None, ""),
        };
        wtr.write_record([
            event.index.to_string(),
            event.time.format(TIME_FORMAT).to_string(),
            event.side.to_string(),
            event.kind.name().to_string(),
            opt(event.kind.price()),
            event
                .kind
                .signal_index()
                .map(|i| i.to_string())
                .unwrap_or_default(),
            opt(high),
            opt(low),
            opt(rsi),
            reason.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export a trade history as CSV. Exit and P&L cells are blank for an open trade.
pub fn export_history_csv(history: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "side",
        "signal_index",
        "signal_time",
        "signal_high",
        "signal_low",
        "entry_index",
        "entry_time",
        "entry_price",
        "exit_index",
        "exit_time",
        "exit_price",
        "exit_type",
        "pnl",
        "pnl_percent",
    ])?;

    for t in history {
        wtr.write_record([
            t.side.to_string(),
            t.signal_index.to_string(),
            t.signal_time.format(TIME_FORMAT).to_string(),
            format!("{:.2}", t.signal_high),
            format!("{:.2}", t.signal_low),
            t.entry_index.to_string(),
            t.entry_time.format(TIME_FORMAT).to_string(),
            format!("{:.2}", t.entry_price),
            t.exit_index.map(|i| i.to_string()).unwrap_or_default(),
            t.exit_time
                .map(|time| time.format(TIME_FORMAT).to_string())
                .unwrap_or_default(),
            opt(t.exit_price),
            t.exit_type.map(|r| r.to_string()).unwrap_or_default(),
            opt(t.pnl),
            opt(t.pnl_percent),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one day.
///
/// Creates `{instrument}_{day}_{hash}/` under `output_dir`, where `hash` is the
/// short dataset hash, containing:
/// - `result.json`: the full `DayResult`
/// - `events.csv` and `trades.csv` when `with_csv` is set
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &DayResult, output_dir: &Path, with_csv: bool) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}_{}",
        result.instrument,
        result.day,
        result.fingerprint.dataset_hash.short()
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("result.json"), export_json(result)?)?;
    if with_csv {
        std::fs::write(run_dir.join("events.csv"), export_events_csv(&result.result.events)?)?;
        std::fs::write(run_dir.join("trades.csv"), export_history_csv(&result.result.history)?)?;
    }

    Ok(run_dir)
}

/// Load a `DayResult` from an artifact directory or a `result.json` path.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(path: &Path) -> Result<DayResult> {
    let json_path = if path.is_dir() {
        path.join("result.json")
    } else {
        path.to_path_buf()
    };
    let json = std::fs::read_to_string(&json_path)
        .with_context(|| format!("failed to read {}", json_path.display()))?;
    import_json(&json)
}
