//! Live monitoring: the same state machine, fed one closed candle at a time.
//!
//! A monitor fed a whole day produces exactly the log a replay of that day
//! produces. It rejects candles that arrive out of sequence instead of
//! reordering them.

use crate::config::{ConfigError, StrategyConfig};
use crate::domain::{
    ActiveTrade, Candle, CandleSeries, Event, RawCandle, SeriesError, Side, SignalCandle,
    TradeRecord,
};
use crate::history::{reconcile, TradeSummary};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::quality::scan_series;
use super::replay::ReplayResult;
use super::side_state::{SideState, TargetConfirmState};
use super::state_machine::{EnginePhase, TradeStateMachine};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The candle cannot extend the session; same checks as [`CandleSeries::new`].
    #[error("rejected candle: {0}")]
    Candle(#[from] SeriesError),
}

/// What one side looks like right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideStatus {
    pub signal: Option<SignalCandle>,
    pub entry_gate: bool,
    /// Close level that would trigger an entry.
    pub break_level: Option<f64>,
    /// Close level that would stop a trade on this side out.
    pub stop_level: Option<f64>,
    pub target: TargetConfirmState,
}

impl SideStatus {
    fn of(state: &SideState) -> Self {
        let signal = state.signal().copied();
        Self {
            signal,
            entry_gate: state.entry_gate(),
            break_level: signal.map(|s| s.entry_level()),
            stop_level: signal.map(|s| s.stop_level()),
            target: state.target(),
        }
    }
}

/// Point-in-time snapshot of a monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub phase: EnginePhase,
    pub active_trade: Option<ActiveTrade>,
    pub pe: SideStatus,
    pub ce: SideStatus,
    pub candles_seen: usize,
    pub warming_up: bool,
    pub last_time: Option<NaiveDateTime>,
}

impl MonitorStatus {
    pub fn side(&self, side: Side) -> &SideStatus {
        match side {
            Side::Pe => &self.pe,
            Side::Ce => &self.ce,
        }
    }
}

/// Incremental driver around [`TradeStateMachine`].
#[derive(Debug, Clone)]
pub struct LiveMonitor {
    machine: TradeStateMachine,
    candles: Vec<Candle>,
}

impl LiveMonitor {
    pub fn new(config: StrategyConfig) -> Result<Self, MonitorError> {
        config.validate()?;
        Ok(Self {
            machine: TradeStateMachine::new(config),
            candles: Vec::new(),
        })
    }

    /// Feed the next closed candle and return the events it produced.
    pub fn push(&mut self, candle: Candle) -> Result<&[Event], MonitorError> {
        candle.validate_next(self.candles.len(), self.candles.last())?;
        let before = self.machine.log().len();
        self.machine.step(&candle);
        self.candles.push(candle);
        Ok(self.machine.log().since(before))
    }

    /// Feed a bar with its indicator values; the index is assigned here.
    pub fn push_raw(
        &mut self,
        bar: RawCandle,
        ema: Option<f64>,
        rsi: Option<f64>,
    ) -> Result<&[Event], MonitorError> {
        let candle = Candle {
            index: self.candles.len(),
            time: bar.time,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            ema,
            rsi,
        };
        self.push(candle)
    }

    pub fn status(&self) -> MonitorStatus {
        MonitorStatus {
            phase: self.machine.phase(),
            active_trade: self.machine.active_trade().copied(),
            pe: SideStatus::of(self.machine.side(Side::Pe)),
            ce: SideStatus::of(self.machine.side(Side::Ce)),
            candles_seen: self.machine.candles_seen(),
            warming_up: self.machine.is_warming_up(),
            last_time: self.candles.last().map(|c| c.time),
        }
    }

    pub fn events(&self) -> &[Event] {
        self.machine.log().events()
    }

    /// Trade history so far, including an open trade.
    pub fn history(&self) -> Vec<TradeRecord> {
        reconcile(self.machine.log(), self.machine.config().lot_multiplier)
            .expect("engine output always reconciles")
    }

    /// Close the session and produce the same result shape a replay does.
    pub fn finish(self) -> ReplayResult {
        let history = self.history();
        let config = self.machine.config().clone();
        let bar_count = self.candles.len();
        let series =
            CandleSeries::new(self.candles).expect("monitor only accepts ordered, finite candles");
        let warnings = scan_series(&series, &config);
        let events = self.machine.into_log();

        ReplayResult {
            signals: events.signals(),
            summary: TradeSummary::compute(&history),
            events,
            history,
            warnings,
            bar_count,
            warmup_bars: config.ema_period,
        }
    }
}
