//! Day replay: validate inputs, run the state machine over every candle,
//! reconcile the resulting log.

use crate::config::{ConfigError, StrategyConfig};
use crate::domain::{CandleSeries, EventLog, SignalCandle, TradeRecord};
use crate::history::{reconcile, TradeSummary};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::quality::{scan_series, DataQualityWarning};
use super::state_machine::TradeStateMachine;

/// Reasons a replay produces no output at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReplayError {
    #[error("invalid strategy config: {0}")]
    Config(#[from] ConfigError),

    #[error("insufficient data: {available} candles, need at least {required}")]
    InsufficientData { available: usize, required: usize },

    #[error("insufficient EMA values: {available} present, need at least {required}")]
    InsufficientIndicators { available: usize, required: usize },
}

/// Everything a replay of one day produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayResult {
    pub events: EventLog,
    /// Every signal candle that became live, in order.
    pub signals: Vec<SignalCandle>,
    pub history: Vec<TradeRecord>,
    pub summary: TradeSummary,
    pub warnings: Vec<DataQualityWarning>,
    pub bar_count: usize,
    /// Leading candles used only to seed the EMA.
    pub warmup_bars: usize,
}

/// Replay one day of candles.
///
/// Pure and deterministic: the same series and config always produce the
/// same result, byte for byte once serialized.
pub fn replay(series: &CandleSeries, config: &StrategyConfig) -> Result<ReplayResult, ReplayError> {
    config.validate()?;

    let required = config.min_candles();
    if series.len() < required {
        return Err(ReplayError::InsufficientData {
            available: series.len(),
            required,
        });
    }
    let ema_count = series.ema_count();
    if ema_count < required {
        return Err(ReplayError::InsufficientIndicators {
            available: ema_count,
            required,
        });
    }

    let warnings = scan_series(series, config);
    let mut machine = TradeStateMachine::new(config.clone());
    for candle in series {
        machine.step(candle);
    }
    let events = machine.into_log();

    let history = reconcile(&events, config.lot_multiplier)
        .expect("engine output always reconciles");
    let summary = TradeSummary::compute(&history);

    debug!(
        bars = series.len(),
        events = events.len(),
        trades = history.len(),
        warnings = warnings.len(),
        "replay complete"
    );

    Ok(ReplayResult {
        signals: events.signals(),
        events,
        history,
        summary,
        warnings,
        bar_count: series.len(),
        warmup_bars: config.ema_period,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawCandle;
    use chrono::NaiveDate;

    fn flat_series(n: usize, ema: Option<f64>) -> CandleSeries {
        let bars: Vec<_> = (0..n)
            .map(|i| RawCandle {
                time: NaiveDate::from_ymd_opt(2024, 3, 1)
                    .unwrap()
                    .and_hms_opt(9, 15, 0)
                    .unwrap()
                    + chrono::Duration::minutes(5 * i as i64),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
            })
            .collect();
        CandleSeries::from_parts(&bars, &vec![ema; n], &vec![Some(50.0); n]).unwrap()
    }

    #[test]
    fn test_too_few_candles() {
        let err = replay(&flat_series(5, Some(100.0)), &StrategyConfig::default()).unwrap_err();
        assert_eq!(err, ReplayError::InsufficientData { available: 5, required: 6 });
    }

    #[test]
    fn test_too_few_ema_values() {
        let err = replay(&flat_series(10, None), &StrategyConfig::default()).unwrap_err();
        assert_eq!(err, ReplayError::InsufficientIndicators { available: 0, required: 6 });
    }

    #[test]
    fn test_bad_config_is_rejected_before_replay() {
        let config = StrategyConfig {
            lot_multiplier: -1.0,
            ..StrategyConfig::default()
        };
        assert!(matches!(
            replay(&flat_series(10, Some(100.0)), &config),
            Err(ReplayError::Config(ConfigError::InvalidLotMultiplier(_)))
        ));
    }

    #[test]
    fn test_quiet_day_produces_empty_result() {
        let result = replay(&flat_series(20, Some(100.0)), &StrategyConfig::default()).unwrap();
        assert!(result.events.is_empty());
        assert!(result.history.is_empty());
        assert_eq!(result.bar_count, 20);
        assert_eq!(result.warmup_bars, 5);
        assert!(result.warnings.is_empty());
    }
}
