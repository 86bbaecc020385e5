//! Domain types for the Mountain Signal engine

pub mod candle;
pub mod event;
pub mod side;
pub mod signal;
pub mod trade;

pub use candle::{Candle, CandleSeries, RawCandle, SeriesError};
pub use event::{Event, EventKind, EventLog, ExitReason};
pub use side::Side;
pub use signal::SignalCandle;
pub use trade::{ActiveTrade, TradeRecord};
