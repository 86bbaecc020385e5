//! Trade history reconciler: a single fold over the event log.
//!
//! `ENTRY` opens a record against the signal it references; the next exit on
//! the same side closes it. A position still open at the end of the log is
//! kept with empty exit fields.

use crate::domain::{Event, EventKind, EventLog, ExitReason, Side, SignalCandle, TradeRecord};
use std::collections::BTreeMap;
use thiserror::Error;

/// A log that cannot be folded into a trade history.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    #[error("event at candle {index} references unknown {side} signal {signal_index}")]
    UnknownSignal {
        index: usize,
        side: Side,
        signal_index: usize,
    },

    #[error("entry at candle {index} while a {open_side} trade is still open")]
    EntryWhileOpen { index: usize, open_side: Side },

    #[error("{reason} at candle {index} without an open trade")]
    ExitWithoutEntry { index: usize, reason: ExitReason },

    #[error("{found} exit at candle {index} but the open trade is {expected}")]
    SideMismatch {
        index: usize,
        expected: Side,
        found: Side,
    },
}

/// Fold an event log into trade records, in entry order.
pub fn reconcile(log: &EventLog, lot_multiplier: f64) -> Result<Vec<TradeRecord>, ReconcileError> {
    let mut signals: BTreeMap<(Side, usize), SignalCandle> = BTreeMap::new();
    let mut history = Vec::new();
    let mut open: Option<TradeRecord> = None;

    for event in log {
        match &event.kind {
            EventKind::Signal { .. } => {
                if let Some(signal) = event.as_signal() {
                    signals.insert((signal.side, signal.index), signal);
                }
            }
            EventKind::IgnoredSignal { .. } => {}
            EventKind::Entry { price, signal_index } => {
                if let Some(current) = &open {
                    return Err(ReconcileError::EntryWhileOpen {
                        index: event.index,
                        open_side: current.side,
                    });
                }
                let signal = lookup(&signals, event, *signal_index)?;
                open = Some(TradeRecord::open(signal, event.index, event.time, *price));
            }
            kind => {
                // Remaining variants are exits.
                let (Some(reason), Some(price), Some(signal_index)) =
                    (kind.exit_reason(), kind.price(), kind.signal_index())
                else {
                    continue;
                };
                let mut record = open.take().ok_or_else(|| ReconcileError::ExitWithoutEntry {
                    index: event.index,
                    reason,
                })?;
                if record.side != event.side {
                    return Err(ReconcileError::SideMismatch {
                        index: event.index,
                        expected: record.side,
                        found: event.side,
                    });
                }
                lookup(&signals, event, signal_index)?;
                record.close(event.index, event.time, price, reason, lot_multiplier);
                history.push(record);
            }
        }
    }

    history.extend(open);
    Ok(history)
}

fn lookup<'a>(
    signals: &'a BTreeMap<(Side, usize), SignalCandle>,
    event: &Event,
    signal_index: usize,
) -> Result<&'a SignalCandle, ReconcileError> {
    signals
        .get(&(event.side, signal_index))
        .ok_or(ReconcileError::UnknownSignal {
            index: event.index,
            side: event.side,
            signal_index,
        })
}
