//! Mountain CLI: replay, batch, monitor and inspect commands.
//!
//! Commands:
//! - `replay`: replay one CSV day file, print a summary, save artifacts
//! - `batch`: replay every CSV day file in a directory in parallel
//! - `monitor`: feed a day file candle by candle, printing events as they fire
//! - `inspect`: print the summary of a saved result

use anyhow::{bail, Context, Result};
use chrono::NaiveTime;
use clap::{Args, Parser, Subcommand};
use mountain_core::{Event, EventKind, LiveMonitor, RunFingerprint, TradeSummary};
use mountain_runner::{
    aggregate, list_day_files, load_artifacts, load_day, run_day, run_days, save_artifacts,
    DayResult, RunConfig,
};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "mountain",
    about = "Mountain Signal: intraday signal detection and trade replay"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay one day file and save its artifacts.
    Replay {
        /// CSV day file (time,open,high,low,close,ema,rsi).
        file: PathBuf,

        #[command(flatten)]
        opts: RunOpts,

        /// Print the full result JSON to stdout instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Replay every .csv day file in a directory.
    Batch {
        /// Directory of CSV day files.
        dir: PathBuf,

        #[command(flatten)]
        opts: RunOpts,
    },
    /// Feed a day file to the live monitor one candle at a time.
    Monitor {
        /// CSV day file.
        file: PathBuf,

        #[command(flatten)]
        opts: RunOpts,
    },
    /// Print the summary of a saved result (artifact directory or result.json).
    Inspect {
        path: PathBuf,

        /// Also print every event.
        #[arg(long, default_value_t = false)]
        events: bool,

        /// Another saved result to compare fingerprints with.
        #[arg(long)]
        against: Option<PathBuf>,
    },
}

/// Options shared by the commands that replay data.
#[derive(Args)]
struct RunOpts {
    /// Path to a TOML run config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the lot multiplier.
    #[arg(long)]
    lot_multiplier: Option<f64>,

    /// Override the square-off time (HH:MM).
    #[arg(long)]
    forced_exit: Option<String>,

    /// Override the instrument label.
    #[arg(long)]
    instrument: Option<String>,

    /// Output directory for artifacts.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Do not write any artifacts.
    #[arg(long, default_value_t = false)]
    no_save: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay { file, opts, json } => run_replay_cmd(file, opts, json),
        Commands::Batch { dir, opts } => run_batch_cmd(dir, opts),
        Commands::Monitor { file, opts } => run_monitor_cmd(file, opts),
        Commands::Inspect {
            path,
            events,
            against,
        } => run_inspect_cmd(path, events, against),
    }
}

fn build_config(opts: &RunOpts) -> Result<RunConfig> {
    let mut config = match &opts.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    if let Some(lot) = opts.lot_multiplier {
        config.strategy.lot_multiplier = lot;
    }
    if let Some(time) = &opts.forced_exit {
        config.strategy.forced_exit_time = NaiveTime::parse_from_str(time, "%H:%M")
            .with_context(|| format!("invalid --forced-exit '{time}', expected HH:MM"))?;
    }
    if let Some(instrument) = &opts.instrument {
        config.run.instrument = instrument.clone();
    }
    if let Some(dir) = &opts.output_dir {
        config.run.output_dir = dir.clone();
    }

    config
        .strategy
        .validate()
        .context("invalid strategy after applying overrides")?;
    Ok(config)
}

fn run_replay_cmd(file: PathBuf, opts: RunOpts, json: bool) -> Result<()> {
    let config = build_config(&opts)?;
    let day = run_day(&file, &config).with_context(|| format!("replay of {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&day)?);
    } else {
        print_day(&day, true);
    }

    if !opts.no_save {
        let run_dir = save_artifacts(&day, &config.run.output_dir, config.run.export_csv)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_batch_cmd(dir: PathBuf, opts: RunOpts) -> Result<()> {
    let config = build_config(&opts)?;
    let files = list_day_files(&dir)?;
    info!(days = files.len(), dir = %dir.display(), "batch started");

    let mut days = Vec::new();
    let mut failures = 0usize;
    for (path, outcome) in run_days(&files, &config) {
        match outcome {
            Ok(day) => {
                print_day(&day, false);
                if !opts.no_save {
                    save_artifacts(&day, &config.run.output_dir, config.run.export_csv)?;
                }
                days.push(day);
            }
            Err(e) => {
                error!(file = %path.display(), error = %e, "day failed");
                failures += 1;
            }
        }
    }

    println!();
    println!("=== Batch: {} days, {} failed ===", days.len(), failures);
    print_summary(&aggregate(&days));

    if days.is_empty() {
        bail!("no day in {} could be replayed", dir.display());
    }
    Ok(())
}

fn run_monitor_cmd(file: PathBuf, opts: RunOpts) -> Result<()> {
    let config = build_config(&opts)?;
    let day = load_day(&file)?;
    let mut monitor = LiveMonitor::new(config.strategy.clone())?;

    for candle in &day.series {
        for event in monitor.push(*candle)? {
            println!("{}", format_event(event));
        }
    }

    let status = monitor.status();
    println!();
    println!("Final status:");
    println!("{}", serde_json::to_string_pretty(&status)?);

    let result = monitor.finish();
    println!();
    print_summary(&result.summary);
    Ok(())
}

fn run_inspect_cmd(path: PathBuf, events: bool, against: Option<PathBuf>) -> Result<()> {
    let day = load_artifacts(&path)?;
    print_day(&day, true);
    if events {
        println!();
        for event in &day.result.events {
            println!("{}", format_event(event));
        }
    }
    if let Some(other_path) = against {
        let other = load_artifacts(&other_path)
            .with_context(|| format!("loading {}", other_path.display()))?;
        println!();
        println!(
            "Against {}: {}",
            other_path.display(),
            compare_fingerprints(&day.fingerprint, &other.fingerprint)
        );
    }
    Ok(())
}

fn compare_fingerprints(a: &RunFingerprint, b: &RunFingerprint) -> &'static str {
    match (a.same_inputs(b), a.events_hash == b.events_hash) {
        (true, true) => "same inputs, same events",
        (true, false) => "same inputs, DIFFERENT events",
        (false, true) => "different inputs, same events",
        (false, false) => "different inputs",
    }
}

// ── Output ───────────────────────────────────────────────────────────

fn print_day(day: &DayResult, detailed: bool) {
    let summary = &day.result.summary;
    println!(
        "{} {}: {} bars, {} signals, {} trades, P&L {:.2}",
        day.instrument,
        day.day,
        day.result.bar_count,
        day.result.signals.len(),
        summary.trade_count,
        summary.total_pnl
    );
    if !detailed {
        return;
    }

    println!("  Dataset hash: {}", day.fingerprint.dataset_hash.short());
    for warning in &day.result.warnings {
        println!("  Warning: {warning}");
    }
    for trade in &day.result.history {
        let exit = match (trade.exit_type, trade.exit_price, trade.exit_time) {
            (Some(reason), Some(price), Some(time)) => {
                format!("{reason} @ {price:.2} ({})", time.format("%H:%M"))
            }
            _ => "OPEN".to_string(),
        };
        let held = trade
            .bars_held()
            .map(|n| format!("{n} bars"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} signal {} | entry @ {:.2} ({}) | {} | {} | P&L {}",
            trade.side,
            trade.signal_index,
            trade.entry_price,
            trade.entry_time.format("%H:%M"),
            exit,
            held,
            trade
                .pnl
                .map(|p| format!("{p:.2}"))
                .unwrap_or_else(|| "-".to_string())
        );
    }
    print_summary(summary);
}

fn print_summary(summary: &TradeSummary) {
    println!(
        "  Trades: {} ({} closed, {} open) | Win rate: {:.1}% | Total P&L: {:.2} ({:.2}%)",
        summary.trade_count,
        summary.closed,
        summary.open,
        summary.win_rate * 100.0,
        summary.total_pnl,
        summary.total_pnl_percent
    );
    println!(
        "  Exits: {} stop loss, {} target, {} market close",
        summary.stop_losses, summary.targets, summary.market_closes
    );
}

fn format_event(event: &Event) -> String {
    let detail = match &event.kind {
        EventKind::Signal { high, low, rsi } => format!(
            "high {high:.2} low {low:.2} rsi {}",
            rsi.map(|r| format!("{r:.2}")).unwrap_or_else(|| "N/A".to_string())
        ),
        EventKind::IgnoredSignal { reason, .. } => reason.clone(),
        kind => format!(
            "@ {:.2} (signal {})",
            kind.price().unwrap_or_default(),
            kind.signal_index().unwrap_or_default()
        ),
    };
    format!(
        "[{:>3}] {} {} {:<14} {}",
        event.index,
        event.time.format("%H:%M"),
        event.side,
        event.kind.name(),
        detail
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mountain_core::ContentHash;

    fn fingerprint(dataset: &str, events: &str) -> RunFingerprint {
        RunFingerprint {
            dataset_hash: ContentHash(dataset.into()),
            config_hash: ContentHash("config".into()),
            events_hash: ContentHash(events.into()),
        }
    }

    #[test]
    fn test_compare_fingerprints() {
        let base = fingerprint("day", "log");
        assert_eq!(compare_fingerprints(&base, &base), "same inputs, same events");
        assert_eq!(
            compare_fingerprints(&base, &fingerprint("day", "other")),
            "same inputs, DIFFERENT events"
        );
        assert_eq!(
            compare_fingerprints(&base, &fingerprint("other", "other")),
            "different inputs"
        );
    }
}
