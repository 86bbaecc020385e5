//! Per-side state: the signal tracker, entry gate and target confirmation.
//!
//! One `SideState` exists for PE and one for CE. They never look at each other;
//! the trade state machine owns both and decides which one may trade.

use crate::config::{StrategyConfig, TARGET_CONFIRM_CANDLES};
use crate::domain::{Candle, EventKind, Side, SignalCandle};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Two-phase target rule: arm on a bar entirely across the EMA, then require
/// consecutive closes back across it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfirmState {
    pub armed: bool,
    pub consecutive: u32,
}

impl TargetConfirmState {
    /// Feed one in-trade candle. Returns true when the target is confirmed.
    ///
    /// PE arms on `high < ema` and counts `close > ema`; CE arms on `low > ema`
    /// and counts `close < ema`. A close on the wrong side of the EMA resets
    /// the counter but keeps the arming.
    pub fn observe(&mut self, side: Side, candle: &Candle, ema: f64) -> bool {
        let (arms, counts, breaks) = match side {
            Side::Pe => (candle.high < ema, candle.close > ema, candle.close <= ema),
            Side::Ce => (candle.low > ema, candle.close < ema, candle.close >= ema),
        };

        if arms {
            self.armed = true;
        }
        if self.armed && counts {
            self.consecutive += 1;
            return self.consecutive >= TARGET_CONFIRM_CANDLES;
        }
        if breaks {
            self.consecutive = 0;
        }
        false
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Live signal and re-entry bookkeeping for one side.
#[derive(Debug, Clone, PartialEq)]
pub struct SideState {
    side: Side,
    signal: Option<SignalCandle>,
    entry_gate: bool,
    entered: BTreeSet<usize>,
    target: TargetConfirmState,
}

impl SideState {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            signal: None,
            entry_gate: false,
            entered: BTreeSet::new(),
            target: TargetConfirmState::default(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn signal(&self) -> Option<&SignalCandle> {
        self.signal.as_ref()
    }

    pub fn entry_gate(&self) -> bool {
        self.entry_gate
    }

    pub fn has_entered(&self, signal_index: usize) -> bool {
        self.entered.contains(&signal_index)
    }

    pub fn target(&self) -> TargetConfirmState {
        self.target
    }

    /// Signal identification for one candle.
    ///
    /// Returns the event to log: `Signal` when the candle qualifies (and replaces
    /// any live signal), `IgnoredSignal` when only the RSI condition failed and no
    /// signal is live, otherwise `None`. Without an EMA value nothing is evaluated.
    pub fn identify(&mut self, candle: &Candle, config: &StrategyConfig) -> Option<EventKind> {
        let ema = candle.ema?;
        let geometric = match self.side {
            Side::Pe => candle.low > ema,
            Side::Ce => candle.high < ema,
        };
        if !geometric {
            return None;
        }

        let rsi_ok = candle.rsi.is_some_and(|rsi| match self.side {
            Side::Pe => rsi > config.pe_rsi_threshold,
            Side::Ce => rsi < config.ce_rsi_threshold,
        });

        if rsi_ok {
            self.replace_signal(SignalCandle::from_candle(self.side, candle));
            return Some(EventKind::Signal {
                high: candle.high,
                low: candle.low,
                rsi: candle.rsi,
            });
        }

        // Only logged while the side has no live signal.
        if self.signal.is_none() {
            return Some(EventKind::IgnoredSignal {
                high: candle.high,
                low: candle.low,
                rsi: candle.rsi,
                reason: self.ignored_reason(candle.rsi, config),
            });
        }
        None
    }

    fn replace_signal(&mut self, signal: SignalCandle) {
        if let Some(old) = self.signal.replace(signal) {
            self.entered.remove(&old.index);
        }
        self.entry_gate = false;
    }

    fn ignored_reason(&self, rsi: Option<f64>, config: &StrategyConfig) -> String {
        let (op, threshold) = match self.side {
            Side::Pe => (">", config.pe_rsi_threshold),
            Side::Ce => ("<", config.ce_rsi_threshold),
        };
        let current = rsi.map_or_else(|| "N/A".to_string(), |r| format!("{r:.2}"));
        format!(
            "Signal candle identified but RSI condition not met (RSI must be {op} {threshold}, current: {current})"
        )
    }

    /// Price-action gate. Call only while no trade is open.
    pub fn observe_gate(&mut self, candle: &Candle) {
        if self.entry_gate {
            return;
        }
        if let Some(signal) = &self.signal {
            if signal.is_touched_back(candle) {
                self.entry_gate = true;
            }
        }
    }

    /// The live signal if `close` triggers an entry on it.
    ///
    /// The first entry on a signal needs only the breakout close; a re-entry on
    /// the same signal also needs the gate.
    pub fn entry_candidate(&self, close: f64) -> Option<SignalCandle> {
        let signal = self.signal?;
        let allowed = !self.entered.contains(&signal.index) || self.entry_gate;
        (allowed && signal.is_entry_close(close)).then_some(signal)
    }

    pub fn record_entry(&mut self, signal_index: usize) {
        self.entered.insert(signal_index);
        self.entry_gate = false;
    }

    /// Advance the target rule for an open trade on this side.
    pub fn observe_target(&mut self, candle: &Candle, ema: f64) -> bool {
        self.target.observe(self.side, candle, ema)
    }

    /// Stop-loss or target exit: a fresh touch-back is needed before re-entry.
    pub fn on_price_exit(&mut self) {
        self.entry_gate = false;
        self.target.reset();
    }

    /// Square-off exit: signal, gate and entered set are left as they are.
    pub fn on_square_off(&mut self) {
        self.target.reset();
    }
}
