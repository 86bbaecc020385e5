//! SignalCandle: the reference bar that defines a side's thresholds.

use super::candle::Candle;
use super::side::Side;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The extremal candle defining entry and stop levels for one side.
///
/// Immutable: a newer qualifying candle replaces it wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalCandle {
    pub index: usize,
    pub side: Side,
    pub high: f64,
    pub low: f64,
    pub time: NaiveDateTime,
}

impl SignalCandle {
    pub fn from_candle(side: Side, candle: &Candle) -> Self {
        Self {
            index: candle.index,
            side,
            high: candle.high,
            low: candle.low,
            time: candle.time,
        }
    }

    /// Close level that triggers an entry: PE breaks below the low, CE above the high.
    pub fn entry_level(&self) -> f64 {
        match self.side {
            Side::Pe => self.low,
            Side::Ce => self.high,
        }
    }

    /// Close level that stops a trade out: the opposite extreme of the entry level.
    pub fn stop_level(&self) -> f64 {
        match self.side {
            Side::Pe => self.high,
            Side::Ce => self.low,
        }
    }

    /// True if `close` breaks through the entry level.
    pub fn is_entry_close(&self, close: f64) -> bool {
        match self.side {
            Side::Pe => close < self.low,
            Side::Ce => close > self.high,
        }
    }

    /// True if `close` breaks through the stop level.
    pub fn is_stop_close(&self, close: f64) -> bool {
        match self.side {
            Side::Pe => close > self.high,
            Side::Ce => close < self.low,
        }
    }

    /// True if the bar traded back across the entry level, which re-opens the entry gate.
    pub fn is_touched_back(&self, candle: &Candle) -> bool {
        match self.side {
            Side::Pe => candle.high > self.low,
            Side::Ce => candle.low < self.high,
        }
    }
}
