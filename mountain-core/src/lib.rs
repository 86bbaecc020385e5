//! Mountain Core: signal detection and trade lifecycle for the Mountain Signal strategy.
//!
//! This crate replays one intraday session of candles (with precomputed EMA
//! and RSI) and produces:
//! - An append-only event log (signals, ignored signals, entries, exits)
//! - A reconciled trade history with P&L and a summary
//! - Data-quality warnings for the input series
//!
//! Two sides are tracked independently: PE (bearish, signal candle entirely
//! above the EMA) and CE (bullish mirror). At most one trade is open at a time.
//! Everything here is pure: no I/O, no clocks, no randomness.

pub mod config;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod history;

pub use config::{ConfigError, StrategyConfig, TARGET_CONFIRM_CANDLES};
pub use domain::{
    ActiveTrade, Candle, CandleSeries, Event, EventKind, EventLog, ExitReason, RawCandle,
    SeriesError, Side, SignalCandle, TradeRecord,
};
pub use engine::{
    replay, DataQualityWarning, EnginePhase, LiveMonitor, MonitorError, MonitorStatus,
    ReplayError, ReplayResult,
};
pub use fingerprint::{ContentHash, RunFingerprint};
pub use history::{reconcile, ReconcileError, TradeSummary};
