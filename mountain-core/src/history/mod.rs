//! Trade history: the reconciled view of an event log.

pub mod reconcile;
pub mod summary;

pub use reconcile::{reconcile, ReconcileError};
pub use summary::TradeSummary;
