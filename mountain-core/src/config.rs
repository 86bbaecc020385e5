//! Strategy configuration for the Mountain Signal engine.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Candles required in a row, after arming, before a target exit fires.
pub const TARGET_CONFIRM_CANDLES: u32 = 2;

/// Parameters of one strategy instance.
///
/// EMA and RSI are computed by the indicator service; `ema_period` and
/// `rsi_period` are carried so the engine can size the warmup window and
/// record what the indicator series were built with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// EMA lookback. Candles before this index are warmup and never evaluated.
    pub ema_period: usize,
    pub rsi_period: usize,
    /// Bar size. Used to flag gaps in the candle timestamps.
    pub candle_interval_minutes: u32,
    /// Units per lot; P&L in points is multiplied by this.
    pub lot_multiplier: f64,
    /// Exchange-local time at or after which any open trade is squared off.
    pub forced_exit_time: NaiveTime,
    /// PE signal requires RSI strictly above this.
    pub pe_rsi_threshold: f64,
    /// CE signal requires RSI strictly below this.
    pub ce_rsi_threshold: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            ema_period: 5,
            rsi_period: 14,
            candle_interval_minutes: 5,
            lot_multiplier: 50.0,
            forced_exit_time: NaiveTime::from_hms_opt(15, 15, 0).expect("15:15 is a valid time"),
            pe_rsi_threshold: 70.0,
            ce_rsi_threshold: 30.0,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("ema_period must be positive")]
    ZeroEmaPeriod,

    #[error("candle_interval_minutes must be positive")]
    ZeroInterval,

    #[error("lot_multiplier must be a positive finite number, got {0}")]
    InvalidLotMultiplier(f64),

    #[error("{name} must lie within 0..=100, got {value}")]
    RsiThresholdOutOfRange { name: &'static str, value: f64 },

    #[error("pe_rsi_threshold ({pe}) must be above ce_rsi_threshold ({ce})")]
    RsiThresholdsCrossed { pe: f64, ce: f64 },
}

impl StrategyConfig {
    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ema_period == 0 {
            return Err(ConfigError::ZeroEmaPeriod);
        }
        if self.candle_interval_minutes == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if !(self.lot_multiplier.is_finite() && self.lot_multiplier > 0.0) {
            return Err(ConfigError::InvalidLotMultiplier(self.lot_multiplier));
        }
        for (name, value) in [
            ("pe_rsi_threshold", self.pe_rsi_threshold),
            ("ce_rsi_threshold", self.ce_rsi_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::RsiThresholdOutOfRange { name, value });
            }
        }
        if self.pe_rsi_threshold <= self.ce_rsi_threshold {
            return Err(ConfigError::RsiThresholdsCrossed {
                pe: self.pe_rsi_threshold,
                ce: self.ce_rsi_threshold,
            });
        }
        Ok(())
    }

    /// Minimum candles needed for a replay: the warmup window plus one evaluated bar.
    pub fn min_candles(&self) -> usize {
        self.ema_period + 1
    }

    /// True if `time` is at or past the square-off time.
    pub fn is_square_off(&self, time: NaiveTime) -> bool {
        time >= self.forced_exit_time
    }
}
