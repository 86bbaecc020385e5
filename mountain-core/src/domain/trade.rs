//! ActiveTrade and TradeRecord: the open position and its reconciled history row.

use super::event::ExitReason;
use super::side::Side;
use super::signal::SignalCandle;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The single position open across both sides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveTrade {
    pub side: Side,
    pub entry_index: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub signal_index: usize,
}

/// One round trip (or a still-open position) with its profit and loss.
///
/// Exit fields and P&L are `None` while the position is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Signal ──
    pub side: Side,
    pub signal_index: usize,
    pub signal_time: NaiveDateTime,
    pub signal_high: f64,
    pub signal_low: f64,

    // ── Entry ──
    pub entry_index: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_index: Option<usize>,
    pub exit_time: Option<NaiveDateTime>,
    pub exit_price: Option<f64>,
    pub exit_type: Option<ExitReason>,

    // ── PnL ──
    pub pnl: Option<f64>,
    pub pnl_percent: Option<f64>,
}

impl TradeRecord {
    /// Open a record from the originating signal and the entry fill.
    pub fn open(signal: &SignalCandle, entry_index: usize, entry_time: NaiveDateTime, entry_price: f64) -> Self {
        Self {
            side: signal.side,
            signal_index: signal.index,
            signal_time: signal.time,
            signal_high: signal.high,
            signal_low: signal.low,
            entry_index,
            entry_time,
            entry_price,
            exit_index: None,
            exit_time: None,
            exit_price: None,
            exit_type: None,
            pnl: None,
            pnl_percent: None,
        }
    }

    /// Fill in the exit and compute P&L.
    ///
    /// `pnl` is the favourable price move times `lot_multiplier`; `pnl_percent`
    /// is the move relative to the entry price (0 when the entry price is 0).
    pub fn close(
        &mut self,
        exit_index: usize,
        exit_time: NaiveDateTime,
        exit_price: f64,
        reason: ExitReason,
        lot_multiplier: f64,
    ) {
        let points = self.side.favourable_move(self.entry_price, exit_price);
        let pnl_percent = if self.entry_price == 0.0 {
            0.0
        } else {
            points / self.entry_price * 100.0
        };

        self.exit_index = Some(exit_index);
        self.exit_time = Some(exit_time);
        self.exit_price = Some(exit_price);
        self.exit_type = Some(reason);
        self.pnl = Some(points * lot_multiplier);
        self.pnl_percent = Some(pnl_percent);
    }

    pub fn is_open(&self) -> bool {
        self.exit_index.is_none()
    }

    pub fn is_winner(&self) -> bool {
        self.pnl.is_some_and(|p| p > 0.0)
    }

    pub fn is_loser(&self) -> bool {
        self.pnl.is_some_and(|p| p < 0.0)
    }

    /// Candles between entry and exit, `None` while open.
    pub fn bars_held(&self) -> Option<usize> {
        self.exit_index
            .map(|exit| exit.saturating_sub(self.entry_index))
    }
}
