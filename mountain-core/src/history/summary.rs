//! Totals over a trade history.

use crate::domain::{ExitReason, TradeRecord};
use serde::{Deserialize, Serialize};

/// Aggregate figures for one day's trades. Open trades count toward
/// `trade_count` and `open` only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeSummary {
    pub trade_count: usize,
    pub closed: usize,
    pub open: usize,
    pub winners: usize,
    pub losers: usize,
    /// Winners over closed trades, 0 when nothing closed.
    pub win_rate: f64,
    pub total_pnl: f64,
    pub total_pnl_percent: f64,

    // ── Exit breakdown ──
    pub stop_losses: usize,
    pub targets: usize,
    pub market_closes: usize,
}

impl TradeSummary {
    pub fn compute(history: &[TradeRecord]) -> Self {
        let mut summary = Self {
            trade_count: history.len(),
            ..Self::default()
        };

        for trade in history {
            let (Some(pnl), Some(pct), Some(reason)) = (trade.pnl, trade.pnl_percent, trade.exit_type)
            else {
                summary.open += 1;
                continue;
            };
            summary.closed += 1;
            summary.total_pnl += pnl;
            summary.total_pnl_percent += pct;
            if trade.is_winner() {
                summary.winners += 1;
            } else if trade.is_loser() {
                summary.losers += 1;
            }
            match reason {
                ExitReason::StopLoss => summary.stop_losses += 1,
                ExitReason::Target => summary.targets += 1,
                ExitReason::MktClose => summary.market_closes += 1,
            }
        }

        if summary.closed > 0 {
            summary.win_rate = summary.winners as f64 / summary.closed as f64;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Side, SignalCandle};
    use chrono::{NaiveDate, NaiveDateTime};

    fn t(index: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            + chrono::Duration::minutes(5 * index as i64)
    }

    fn trade(side: Side, entry: f64, exit: Option<(f64, ExitReason)>) -> TradeRecord {
        let signal = SignalCandle {
            index: 1,
            side,
            high: 105.0,
            low: 100.0,
            time: t(1),
        };
        let mut record = TradeRecord::open(&signal, 2, t(2), entry);
        if let Some((price, reason)) = exit {
            record.close(3, t(3), price, reason, 50.0);
        }
        record
    }

    #[test]
    fn test_empty_history() {
        let summary = TradeSummary::compute(&[]);
        assert_eq!(summary, TradeSummary::default());
    }

    #[test]
    fn test_mixed_history_totals() {
        let history = vec![
            trade(Side::Pe, 98.0, Some((107.0, ExitReason::StopLoss))),
            trade(Side::Ce, 100.0, Some((104.0, ExitReason::Target))),
            trade(Side::Pe, 100.0, Some((99.0, ExitReason::MktClose))),
            trade(Side::Ce, 100.0, None),
        ];
        let summary = TradeSummary::compute(&history);
        assert_eq!(summary.trade_count, 4);
        assert_eq!(summary.closed, 3);
        assert_eq!(summary.open, 1);
        assert_eq!(summary.winners, 2);
        assert_eq!(summary.losers, 1);
        assert!((summary.win_rate - 2.0 / 3.0).abs() < 1e-12);
        // -450 + 200 + 50
        assert!((summary.total_pnl - (-200.0)).abs() < 1e-9);
        assert_eq!(
            (summary.stop_losses, summary.targets, summary.market_closes),
            (1, 1, 1)
        );
    }
}
