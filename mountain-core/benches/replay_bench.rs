//! Criterion benchmarks for the replay hot path.
//!
//! Benchmarks:
//! 1. Whole-day replay at several session lengths
//! 2. Live monitor fed candle by candle
//! 3. Trade history reconciliation of a finished log

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mountain_core::{reconcile, replay, CandleSeries, LiveMonitor, RawCandle, StrategyConfig};

// ── Helpers ──────────────────────────────────────────────────────────

/// An oscillating session that keeps producing signals on both sides.
fn make_session(n: usize) -> CandleSeries {
    let start = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut ema = Vec::with_capacity(n);
    let mut rsi = Vec::with_capacity(n);
    for i in 0..n {
        let phase = i as f64 * 0.35;
        let close = 100.0 + phase.sin() * 8.0;
        bars.push(RawCandle {
            time: start + chrono::Duration::minutes(i as i64),
            open: close - 0.2,
            high: close + 1.0,
            low: close - 1.0,
            close,
        });
        ema.push(Some(100.0 + (phase - 0.6).sin() * 6.0));
        rsi.push(Some(50.0 + phase.sin() * 35.0));
    }
    CandleSeries::from_parts(&bars, &ema, &rsi).unwrap()
}

fn config() -> StrategyConfig {
    StrategyConfig {
        candle_interval_minutes: 1,
        forced_exit_time: chrono::NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
        ..StrategyConfig::default()
    }
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");
    for n in [75, 375, 1_400] {
        let series = make_session(n);
        let config = config();
        group.bench_with_input(BenchmarkId::from_parameter(n), &series, |b, series| {
            b.iter(|| replay(black_box(series), black_box(&config)).unwrap())
        });
    }
    group.finish();
}

fn bench_monitor(c: &mut Criterion) {
    let series = make_session(375);
    c.bench_function("monitor_375", |b| {
        b.iter(|| {
            let mut monitor = LiveMonitor::new(config()).unwrap();
            for candle in &series {
                black_box(monitor.push(*candle).unwrap());
            }
            monitor.status()
        })
    });
}

fn bench_reconcile(c: &mut Criterion) {
    let series = make_session(1_400);
    let result = replay(&series, &config()).unwrap();
    c.bench_function("reconcile_1400", |b| {
        b.iter(|| reconcile(black_box(&result.events), 50.0).unwrap())
    });
}

criterion_group!(benches, bench_replay, bench_monitor, bench_reconcile);
criterion_main!(benches);
