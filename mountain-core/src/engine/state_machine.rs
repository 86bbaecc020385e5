//! Trade state machine: one global position, evaluated candle by candle.
//!
//! Per candle, in order:
//! 1. Signal identification (PE, then CE)
//! 2. Gate updates, only while flat
//! 3. Entry check, only while flat (PE before CE, at most one entry)
//! 4. Exit checks for the open trade, including one opened on this candle:
//!    square-off, then stop loss, then target
//!
//! Candles inside the warmup window (`index < ema_period`) are skipped entirely.

use crate::config::StrategyConfig;
use crate::domain::{ActiveTrade, Candle, Event, EventKind, EventLog, ExitReason, Side, SignalCandle};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::side_state::SideState;

/// Coarse machine state, derived from the active trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "side", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnginePhase {
    Idle,
    InTrade(Side),
}

/// The replay engine. Owns both side states, the single optional trade and the log.
#[derive(Debug, Clone)]
pub struct TradeStateMachine {
    config: StrategyConfig,
    pe: SideState,
    ce: SideState,
    active: Option<ActiveTrade>,
    log: EventLog,
    candles_seen: usize,
}

impl TradeStateMachine {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            config,
            pe: SideState::new(Side::Pe),
            ce: SideState::new(Side::Ce),
            active: None,
            log: EventLog::new(),
            candles_seen: 0,
        }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn side(&self, side: Side) -> &SideState {
        match side {
            Side::Pe => &self.pe,
            Side::Ce => &self.ce,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut SideState {
        match side {
            Side::Pe => &mut self.pe,
            Side::Ce => &mut self.ce,
        }
    }

    pub fn active_trade(&self) -> Option<&ActiveTrade> {
        self.active.as_ref()
    }

    pub fn phase(&self) -> EnginePhase {
        match &self.active {
            Some(trade) => EnginePhase::InTrade(trade.side),
            None => EnginePhase::Idle,
        }
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn into_log(self) -> EventLog {
        self.log
    }

    /// Candles fed so far, warmup included.
    pub fn candles_seen(&self) -> usize {
        self.candles_seen
    }

    pub fn is_warming_up(&self) -> bool {
        self.candles_seen < self.config.ema_period
    }

    /// Apply one closed candle. Must be called exactly once per candle, in index order.
    pub fn step(&mut self, candle: &Candle) {
        self.candles_seen += 1;
        if candle.index < self.config.ema_period {
            return;
        }

        self.identify_signals(candle);

        // Entry, stop and target need both indicators on the candle; the
        // square-off clock does not.
        let evaluable = candle.has_indicators();

        if self.active.is_none() {
            for side in Side::ALL {
                self.side_mut(side).observe_gate(candle);
            }
            if evaluable {
                self.try_enter(candle);
            }
        }

        if self.active.is_some() {
            self.manage_trade(candle, evaluable);
        }
    }

    fn identify_signals(&mut self, candle: &Candle) {
        for side in Side::ALL {
            let config = &self.config;
            let state = match side {
                Side::Pe => &mut self.pe,
                Side::Ce => &mut self.ce,
            };
            if let Some(kind) = state.identify(candle, config) {
                self.emit(candle, side, kind);
            }
        }
    }

    fn try_enter(&mut self, candle: &Candle) {
        for side in Side::ALL {
            if let Some(signal) = self.side(side).entry_candidate(candle.close) {
                self.open_trade(candle, signal);
                return;
            }
        }
    }

    fn open_trade(&mut self, candle: &Candle, signal: SignalCandle) {
        assert!(
            self.active.is_none(),
            "entry at candle {} while a trade is already open",
            candle.index
        );

        self.active = Some(ActiveTrade {
            side: signal.side,
            entry_index: candle.index,
            entry_time: candle.time,
            entry_price: candle.close,
            signal_index: signal.index,
        });
        self.side_mut(signal.side).record_entry(signal.index);
        self.emit(
            candle,
            signal.side,
            EventKind::Entry {
                price: candle.close,
                signal_index: signal.index,
            },
        );
    }

    fn manage_trade(&mut self, candle: &Candle, evaluable: bool) {
        let Some(trade) = self.active else {
            return;
        };
        // Exits are measured against the side's current signal, which may have
        // been replaced since entry.
        let signal = *self
            .side(trade.side)
            .signal()
            .expect("an open trade always has a live signal on its side");

        if self.config.is_square_off(candle.time.time()) {
            self.close_trade(candle, &signal, ExitReason::MktClose);
            self.side_mut(trade.side).on_square_off();
            return;
        }

        if !evaluable {
            return;
        }

        if signal.is_stop_close(candle.close) {
            self.close_trade(candle, &signal, ExitReason::StopLoss);
            self.side_mut(trade.side).on_price_exit();
            return;
        }

        let Some(ema) = candle.ema else {
            return;
        };
        if self.side_mut(trade.side).observe_target(candle, ema) {
            self.close_trade(candle, &signal, ExitReason::Target);
            self.side_mut(trade.side).on_price_exit();
        }
    }

    fn close_trade(&mut self, candle: &Candle, signal: &SignalCandle, reason: ExitReason) {
        let trade = self
            .active
            .take()
            .expect("close_trade called without an open trade");
        self.emit(
            candle,
            trade.side,
            EventKind::exit(reason, candle.close, signal.index),
        );
    }

    fn emit(&mut self, candle: &Candle, side: Side, kind: EventKind) {
        debug!(
            index = candle.index,
            time = %candle.time,
            side = %side,
            event = kind.name(),
            price = ?kind.price(),
            "mountain signal event"
        );
        self.log.push(Event {
            index: candle.index,
            time: candle.time,
            side,
            kind,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn t(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn bar(index: usize, time: NaiveDateTime, hlc: (f64, f64, f64), ema: f64, rsi: f64) -> Candle {
        let (high, low, close) = hlc;
        Candle {
            index,
            time,
            open: close,
            high,
            low,
            close,
            ema: Some(ema),
            rsi: Some(rsi),
        }
    }

    fn engine() -> TradeStateMachine {
        TradeStateMachine::new(StrategyConfig {
            ema_period: 0,
            ..StrategyConfig::default()
        })
    }

    #[test]
    fn test_warmup_candles_are_not_evaluated() {
        let mut sm = TradeStateMachine::new(StrategyConfig::default());
        for i in 0..5 {
            sm.step(&bar(i, t(9, 15 + i as u32 * 5), (105.0, 101.0, 102.0), 100.0, 90.0));
        }
        assert!(sm.log().is_empty());
        assert!(!sm.is_warming_up());
        sm.step(&bar(5, t(9, 40), (105.0, 101.0, 102.0), 100.0, 90.0));
        assert_eq!(sm.log().len(), 1);
    }

    #[test]
    fn test_entry_and_stop_on_pe() {
        let mut sm = engine();
        sm.step(&bar(10, t(10, 0), (105.0, 100.0, 103.0), 99.0, 75.0));
        sm.step(&bar(11, t(10, 5), (101.0, 97.0, 98.0), 99.5, 55.0));
        assert_eq!(sm.phase(), EnginePhase::InTrade(Side::Pe));
        sm.step(&bar(12, t(10, 10), (108.0, 99.0, 107.0), 100.0, 60.0));
        assert_eq!(sm.phase(), EnginePhase::Idle);

        let names: Vec<_> = sm.log().iter().map(|e| e.kind.name()).collect();
        assert_eq!(names, vec!["SIGNAL", "ENTRY", "STOP_LOSS"]);
        assert!(!sm.side(Side::Pe).entry_gate());
    }

    #[test]
    fn test_pe_wins_when_both_sides_trigger() {
        let mut sm = engine();
        // PE signal (high 110, low 105), entered and stopped out
        sm.step(&bar(1, t(9, 20), (110.0, 105.0, 108.0), 100.0, 80.0));
        sm.step(&bar(2, t(9, 25), (106.0, 103.0, 104.0), 104.5, 50.0));
        sm.step(&bar(3, t(9, 30), (112.0, 109.0, 111.0), 108.0, 50.0));
        assert_eq!(sm.phase(), EnginePhase::Idle);
        assert!(!sm.side(Side::Pe).entry_gate());

        // CE signal (high 100) without touching back above the PE low
        sm.step(&bar(4, t(9, 35), (100.0, 96.0, 98.0), 102.0, 20.0));
        assert_eq!(sm.log().signals().len(), 2);
        assert_eq!(sm.phase(), EnginePhase::Idle);

        // Touch-back reopens the PE gate; close 102 is below 105 and above 100
        sm.step(&bar(5, t(9, 40), (106.0, 101.0, 102.0), 103.0, 50.0));
        assert_eq!(sm.phase(), EnginePhase::InTrade(Side::Pe));
        assert_eq!(sm.log().entry_count(), 2);
    }

    #[test]
    fn test_entry_after_square_off_time_closes_on_same_candle() {
        let mut sm = engine();
        sm.step(&bar(1, t(15, 10), (105.0, 100.0, 103.0), 99.0, 75.0));
        sm.step(&bar(2, t(15, 15), (101.0, 97.0, 98.0), 99.5, 55.0));
        let names: Vec<_> = sm.log().iter().map(|e| e.kind.name()).collect();
        assert_eq!(names, vec!["SIGNAL", "ENTRY", "MKT_CLOSE"]);
        assert!(sm.active_trade().is_none());
    }

    #[test]
    fn test_missing_indicator_blocks_stop_but_not_square_off() {
        let mut sm = engine();
        sm.step(&bar(1, t(14, 0), (105.0, 100.0, 103.0), 99.0, 75.0));
        sm.step(&bar(2, t(14, 5), (101.0, 97.0, 98.0), 99.5, 55.0));

        let mut gap = bar(3, t(14, 10), (110.0, 104.0, 109.0), 100.0, 60.0);
        gap.rsi = None;
        sm.step(&gap);
        assert_eq!(sm.phase(), EnginePhase::InTrade(Side::Pe));

        let mut late = bar(4, t(15, 15), (110.0, 104.0, 109.0), 100.0, 60.0);
        late.ema = None;
        sm.step(&late);
        assert_eq!(sm.phase(), EnginePhase::Idle);
        assert_eq!(
            sm.log().events().last().unwrap().kind.exit_reason(),
            Some(ExitReason::MktClose)
        );
    }

    #[test]
    fn test_exit_uses_replacement_signal() {
        let mut sm = engine();
        sm.step(&bar(1, t(10, 0), (105.0, 100.0, 103.0), 99.0, 75.0));
        sm.step(&bar(2, t(10, 5), (101.0, 97.0, 98.0), 99.5, 55.0));
        // New PE signal while in trade: low 96 above EMA 90
        sm.step(&bar(3, t(10, 10), (99.0, 96.0, 97.0), 90.0, 72.0));
        assert_eq!(sm.side(Side::Pe).signal().unwrap().index, 3);
        // 100 is above the new high (99) but below the old one (105)
        sm.step(&bar(4, t(10, 15), (101.0, 97.0, 100.0), 91.0, 60.0));

        let last = sm.log().events().last().unwrap();
        assert_eq!(last.kind.exit_reason(), Some(ExitReason::StopLoss));
        assert_eq!(last.kind.signal_index(), Some(3));
    }
}
