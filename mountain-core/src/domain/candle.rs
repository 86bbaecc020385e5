//! Candle and CandleSeries: the immutable, ordered input of a replay.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Intraday OHLC bar as supplied by the quote source, before indicator alignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawCandle {
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// One bar of the day with its aligned indicator values.
///
/// `time` is exchange-local wall-clock time; the forced-exit rule compares its
/// time-of-day directly. `ema` and `rsi` are `None` where the indicator service
/// had no value (e.g. the RSI warmup window). A missing value is never read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub index: usize,
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub ema: Option<f64>,
    pub rsi: Option<f64>,
}

impl Candle {
    /// True if every OHLC field is a finite number.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }

    /// OHLC consistency: high is the top of the bar and low is the bottom.
    pub fn is_sane(&self) -> bool {
        self.is_finite()
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }

    /// Both indicators are present for this bar.
    pub fn has_indicators(&self) -> bool {
        self.ema.is_some() && self.rsi.is_some()
    }

    /// Check that this candle can sit at `position` in a series, right after `previous`.
    /// Shared by series construction and the live monitor.
    pub fn validate_next(&self, position: usize, previous: Option<&Candle>) -> Result<(), SeriesError> {
        if self.index != position {
            return Err(SeriesError::IndexMismatch {
                position,
                index: self.index,
            });
        }
        if !self.is_finite() {
            return Err(SeriesError::NonFinitePrice { index: position });
        }
        for (indicator, value) in [("ema", self.ema), ("rsi", self.rsi)] {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(SeriesError::NonFiniteIndicator {
                    indicator,
                    index: position,
                });
            }
        }
        match previous {
            Some(prev) if self.time <= prev.time => Err(SeriesError::OutOfOrder {
                index: position,
                time: self.time,
                previous: prev.time,
            }),
            _ => Ok(()),
        }
    }
}

/// Errors raised while assembling a candle series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("{indicator} series has {actual} values but there are {expected} candles")]
    Misaligned {
        indicator: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("candle at position {position} carries index {index}")]
    IndexMismatch { position: usize, index: usize },

    #[error("candle {index} at {time} does not follow the previous candle at {previous}")]
    OutOfOrder {
        index: usize,
        time: NaiveDateTime,
        previous: NaiveDateTime,
    },

    #[error("candle {index} has a non-finite OHLC value")]
    NonFinitePrice { index: usize },

    #[error("{indicator} value at index {index} is not finite")]
    NonFiniteIndicator { indicator: &'static str, index: usize },
}

/// A validated, index-ordered day of candles.
///
/// Construction guarantees that `candles[i].index == i`, timestamps strictly
/// increase, OHLC values are finite and any present indicator value is finite.
/// The series is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Candle>", into = "Vec<Candle>")]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Validate an already indexed list of candles.
    pub fn new(candles: Vec<Candle>) -> Result<Self, SeriesError> {
        let mut previous = None;
        for (position, candle) in candles.iter().enumerate() {
            candle.validate_next(position, previous)?;
            previous = Some(candle);
        }
        Ok(Self { candles })
    }

    /// Zip bars with their EMA and RSI series.
    ///
    /// The three inputs must have identical length; a shorter or longer
    /// indicator series is rejected rather than padded.
    pub fn from_parts(
        bars: &[RawCandle],
        ema: &[Option<f64>],
        rsi: &[Option<f64>],
    ) -> Result<Self, SeriesError> {
        if ema.len() != bars.len() {
            return Err(SeriesError::Misaligned {
                indicator: "ema",
                expected: bars.len(),
                actual: ema.len(),
            });
        }
        if rsi.len() != bars.len() {
            return Err(SeriesError::Misaligned {
                indicator: "rsi",
                expected: bars.len(),
                actual: rsi.len(),
            });
        }

        let candles = bars
            .iter()
            .zip(ema.iter().zip(rsi.iter()))
            .enumerate()
            .map(|(index, (bar, (&ema, &rsi)))| Candle {
                index,
                time: bar.time,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                ema,
                rsi,
            })
            .collect();

        Self::new(candles)
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    /// Number of candles with an EMA value.
    pub fn ema_count(&self) -> usize {
        self.candles.iter().filter(|c| c.ema.is_some()).count()
    }

    /// Calendar date of the first candle.
    pub fn trading_date(&self) -> Option<NaiveDate> {
        self.candles.first().map(|c| c.time.date())
    }
}

impl TryFrom<Vec<Candle>> for CandleSeries {
    type Error = SeriesError;

    fn try_from(candles: Vec<Candle>) -> Result<Self, Self::Error> {
        Self::new(candles)
    }
}

impl From<CandleSeries> for Vec<Candle> {
    fn from(series: CandleSeries) -> Self {
        series.candles
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}
