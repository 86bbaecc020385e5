//! Replay engine: per-side signal tracking, the trade state machine, and the
//! two ways of driving it (whole-day replay and live monitoring).
//!
//! Per candle:
//!
//! 1. Signal identification, PE then CE
//! 2. Gate updates while flat
//! 3. Entry check while flat
//! 4. Exit checks while in a trade

pub mod monitor;
pub mod quality;
pub mod replay;
pub mod side_state;
pub mod state_machine;

pub use monitor::{LiveMonitor, MonitorError, MonitorStatus, SideStatus};
pub use quality::{scan_series, DataQualityWarning};
pub use replay::{replay, ReplayError, ReplayResult};
pub use side_state::{SideState, TargetConfirmState};
pub use state_machine::{EnginePhase, TradeStateMachine};
