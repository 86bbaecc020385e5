//! Event log: the append-only record of everything the engine decided.
//!
//! Chart annotation reads the log directly; the trade history is a fold over it.

use super::side::Side;
use super::signal::SignalCandle;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    StopLoss,
    Target,
    MktClose,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "STOP_LOSS",
            ExitReason::Target => "TARGET",
            ExitReason::MktClose => "MKT_CLOSE",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of an event, tagged with the event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// A new signal candle became live for the side.
    Signal { high: f64, low: f64, rsi: Option<f64> },
    /// The bar met the geometric condition but not the RSI threshold.
    IgnoredSignal {
        high: f64,
        low: f64,
        rsi: Option<f64>,
        reason: String,
    },
    Entry { price: f64, signal_index: usize },
    StopLoss { price: f64, signal_index: usize },
    Target { price: f64, signal_index: usize },
    MktClose { price: f64, signal_index: usize },
}

impl EventKind {
    pub fn exit(reason: ExitReason, price: f64, signal_index: usize) -> Self {
        match reason {
            ExitReason::StopLoss => EventKind::StopLoss { price, signal_index },
            ExitReason::Target => EventKind::Target { price, signal_index },
            ExitReason::MktClose => EventKind::MktClose { price, signal_index },
        }
    }

    /// The exit reason, if this is a closing event.
    pub fn exit_reason(&self) -> Option<ExitReason> {
        match self {
            EventKind::StopLoss { .. } => Some(ExitReason::StopLoss),
            EventKind::Target { .. } => Some(ExitReason::Target),
            EventKind::MktClose { .. } => Some(ExitReason::MktClose),
            _ => None,
        }
    }

    /// Fill price for trade events.
    pub fn price(&self) -> Option<f64> {
        match self {
            EventKind::Entry { price, .. }
            | EventKind::StopLoss { price, .. }
            | EventKind::Target { price, .. }
            | EventKind::MktClose { price, .. } => Some(*price),
            _ => None,
        }
    }

    /// Signal candle index a trade event refers to.
    pub fn signal_index(&self) -> Option<usize> {
        match self {
            EventKind::Entry { signal_index, .. }
            | EventKind::StopLoss { signal_index, .. }
            | EventKind::Target { signal_index, .. }
            | EventKind::MktClose { signal_index, .. } => Some(*signal_index),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Signal { .. } => "SIGNAL",
            EventKind::IgnoredSignal { .. } => "IGNORED_SIGNAL",
            EventKind::Entry { .. } => "ENTRY",
            EventKind::StopLoss { .. } => "STOP_LOSS",
            EventKind::Target { .. } => "TARGET",
            EventKind::MktClose { .. } => "MKT_CLOSE",
        }
    }
}

/// One entry of the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub index: usize,
    pub time: NaiveDateTime,
    pub side: Side,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    pub fn is_entry(&self) -> bool {
        matches!(self.kind, EventKind::Entry { .. })
    }

    pub fn is_exit(&self) -> bool {
        self.kind.exit_reason().is_some()
    }

    pub fn is_trade_event(&self) -> bool {
        self.is_entry() || self.is_exit()
    }

    /// The signal candle announced by a `SIGNAL` event.
    pub fn as_signal(&self) -> Option<SignalCandle> {
        match self.kind {
            EventKind::Signal { high, low, .. } => Some(SignalCandle {
                index: self.index,
                side: self.side,
                high,
                low,
                time: self.time,
            }),
            _ => None,
        }
    }
}

/// Append-only, index-ordered event log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event. Events must arrive in non-decreasing candle order.
    pub fn push(&mut self, event: Event) {
        if let Some(last) = self.events.last() {
            assert!(
                event.index >= last.index,
                "event log must be append-only in candle order ({} after {})",
                event.index,
                last.index
            );
        }
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// Events appended at or after position `from`.
    pub fn since(&self, from: usize) -> &[Event] {
        &self.events[from.min(self.events.len())..]
    }

    /// Every signal candle that became live, in order.
    pub fn signals(&self) -> Vec<SignalCandle> {
        self.events.iter().filter_map(Event::as_signal).collect()
    }

    /// Ignored-signal events only.
    pub fn ignored(&self) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::IgnoredSignal { .. }))
    }

    /// Entry and exit events only.
    pub fn trade_events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(|e| e.is_trade_event())
    }

    pub fn entry_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_entry()).count()
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_event_json_is_flat_and_tagged() {
        let event = Event {
            index: 11,
            time: t(10, 0),
            side: Side::Pe,
            kind: EventKind::Entry {
                price: 98.0,
                signal_index: 10,
            },
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "ENTRY");
        assert_eq!(value["side"], "PE");
        assert_eq!(value["signal_index"], 10);
        let back: Event = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_exit_helpers() {
        let kind = EventKind::exit(ExitReason::MktClose, 101.5, 4);
        assert_eq!(kind.exit_reason(), Some(ExitReason::MktClose));
        assert_eq!(kind.price(), Some(101.5));
        assert_eq!(kind.signal_index(), Some(4));
        assert_eq!(kind.name(), "MKT_CLOSE");
    }

    #[test]
    fn test_signals_are_recovered_from_log() {
        let mut log = EventLog::new();
        log.push(Event {
            index: 5,
            time: t(9, 40),
            side: Side::Ce,
            kind: EventKind::Signal {
                high: 50.0,
                low: 45.0,
                rsi: Some(25.0),
            },
        });
        log.push(Event {
            index: 6,
            time: t(9, 45),
            side: Side::Ce,
            kind: EventKind::Entry {
                price: 52.0,
                signal_index: 5,
            },
        });
        let signals = log.signals();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].high, 50.0);
        assert_eq!(log.trade_events().count(), 1);
        assert_eq!(log.since(1).len(), 1);
        assert_eq!(log.since(9).len(), 0);
    }

    #[test]
    #[should_panic(expected = "append-only")]
    fn test_out_of_order_push_panics() {
        let mut log = EventLog::new();
        let kind = EventKind::Target {
            price: 1.0,
            signal_index: 0,
        };
        log.push(Event {
            index: 3,
            time: t(9, 30),
            side: Side::Pe,
            kind: kind.clone(),
        });
        log.push(Event {
            index: 2,
            time: t(9, 25),
            side: Side::Pe,
            kind,
        });
    }
}
