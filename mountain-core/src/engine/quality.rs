//! Data-quality scan: observations that do not stop a replay but belong in its result.

use crate::config::StrategyConfig;
use crate::domain::CandleSeries;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-fatal problem found in the input series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    /// Spacing between two consecutive candles differs from the configured interval.
    TimeGap {
        index: usize,
        expected_minutes: i64,
        actual_minutes: i64,
    },
    /// OHLC values are inconsistent (e.g. high below low).
    InsaneCandle { index: usize },
    /// Evaluated candles (past warmup) without an indicator value.
    MissingIndicator {
        indicator: String,
        count: usize,
        first_index: usize,
    },
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityWarning::TimeGap {
                index,
                expected_minutes,
                actual_minutes,
            } => write!(
                f,
                "candle {index} is {actual_minutes} minutes after the previous one (expected {expected_minutes})"
            ),
            DataQualityWarning::InsaneCandle { index } => {
                write!(f, "candle {index} has inconsistent OHLC values")
            }
            DataQualityWarning::MissingIndicator {
                indicator,
                count,
                first_index,
            } => write!(
                f,
                "{count} evaluated candles have no {indicator} value (first at index {first_index})"
            ),
        }
    }
}

/// Scan a series for gaps, inconsistent bars and missing indicators.
pub fn scan_series(series: &CandleSeries, config: &StrategyConfig) -> Vec<DataQualityWarning> {
    let mut warnings = Vec::new();
    let expected = i64::from(config.candle_interval_minutes);

    for pair in series.candles().windows(2) {
        let actual = (pair[1].time - pair[0].time).num_minutes();
        if actual != expected {
            warnings.push(DataQualityWarning::TimeGap {
                index: pair[1].index,
                expected_minutes: expected,
                actual_minutes: actual,
            });
        }
    }

    for candle in series.iter().filter(|c| !c.is_sane()) {
        warnings.push(DataQualityWarning::InsaneCandle {
            index: candle.index,
        });
    }

    let evaluated = series.candles().get(config.ema_period..).unwrap_or_default();
    for (indicator, missing) in [
        ("ema", evaluated.iter().filter(|c| c.ema.is_none()).map(|c| c.index).collect::<Vec<_>>()),
        ("rsi", evaluated.iter().filter(|c| c.rsi.is_none()).map(|c| c.index).collect()),
    ] {
        if let Some(&first_index) = missing.first() {
            warnings.push(DataQualityWarning::MissingIndicator {
                indicator: indicator.to_string(),
                count: missing.len(),
                first_index,
            });
        }
    }

    warnings
}
