//! Trade side: the two independently tracked signal tracks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which track a signal, trade or event belongs to.
///
/// `Pe` is the bearish track (signal candle above the EMA, entry on a close
/// below its low). `Ce` is the bullish mirror image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "PE")]
    Pe,
    #[serde(rename = "CE")]
    Ce,
}

impl Side {
    /// Both sides in evaluation order. PE is always evaluated before CE.
    pub const ALL: [Side; 2] = [Side::Pe, Side::Ce];

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Pe => "PE",
            Side::Ce => "CE",
        }
    }

    /// Signed price move in the trade's favour: positive when the trade made money.
    pub fn favourable_move(&self, entry_price: f64, exit_price: f64) -> f64 {
        match self {
            Side::Pe => entry_price - exit_price,
            Side::Ce => exit_price - entry_price,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
