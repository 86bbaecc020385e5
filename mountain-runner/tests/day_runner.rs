//! Runner integration tests: day files on disk through to saved artifacts.

use mountain_runner::{
    aggregate, list_day_files, load_artifacts, load_day, run_day, run_days, run_series,
    save_artifacts, LoadError, RunConfig, RunError,
};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

// ── Helpers ──────────────────────────────────────────────────────────

/// A day with one PE trade stopped out at candle 12.
fn stop_loss_day() -> String {
    let mut rows: Vec<(f64, f64, f64, &str, &str)> = vec![(101.0, 99.0, 100.0, "100", "50"); 10];
    rows[0].3 = "";
    rows[0].4 = "";
    rows.push((105.0, 100.0, 103.0, "98", "75"));
    rows.push((101.0, 97.0, 98.0, "99", "55"));
    rows.push((108.0, 99.0, 107.0, "100", "60"));
    day_csv(&rows)
}

/// A day with no signals.
fn quiet_day() -> String {
    day_csv(&[(101.0, 99.0, 100.0, "100", "50"); 20])
}

fn day_csv(rows: &[(f64, f64, f64, &str, &str)]) -> String {
    let mut out = String::from("time,open,high,low,close,ema,rsi\n");
    for (i, (high, low, close, ema, rsi)) in rows.iter().enumerate() {
        let minutes = 15 + 5 * i;
        writeln!(
            out,
            "2024-03-01 {:02}:{:02}:00,{close},{high},{low},{close},{ema},{rsi}",
            9 + minutes / 60,
            minutes % 60
        )
        .unwrap();
    }
    out
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

// ── Tests ────────────────────────────────────────────────────────────

#[test]
fn test_single_day_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "2024-03-01.csv", &stop_loss_day());

    let day = run_day(&path, &RunConfig::default()).unwrap();
    assert_eq!(day.day, "2024-03-01");
    assert_eq!(day.result.history.len(), 1);
    assert_eq!(day.result.history[0].pnl, Some(-450.0));

    let out = dir.path().join("results");
    let run_dir = save_artifacts(&day, &out, true).unwrap();
    assert!(run_dir.join("result.json").exists());
    assert!(run_dir.join("events.csv").exists());
    assert!(run_dir.join("trades.csv").exists());

    let loaded = load_artifacts(&run_dir).unwrap();
    assert_eq!(loaded, day);
    let loaded = load_artifacts(&run_dir.join("result.json")).unwrap();
    assert_eq!(loaded.fingerprint, day.fingerprint);
}

#[test]
fn test_run_day_fingerprints_with_the_load_hash() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "2024-03-01.csv", &stop_loss_day());
    let config = RunConfig::default();

    let loaded = load_day(&path).unwrap();
    let day = run_day(&path, &config).unwrap();
    assert_eq!(day.fingerprint.dataset_hash, loaded.dataset_hash);

    let in_memory = run_series(&loaded.name, &loaded.series, &config).unwrap();
    assert_eq!(in_memory.fingerprint, day.fingerprint);
}

#[test]
fn test_json_only_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "quiet.csv", &quiet_day());
    let day = run_day(&path, &RunConfig::default()).unwrap();

    let run_dir = save_artifacts(&day, dir.path(), false).unwrap();
    assert!(run_dir.join("result.json").exists());
    assert!(!run_dir.join("events.csv").exists());
}

#[test]
fn test_batch_keeps_order_and_isolates_failures() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.csv", &stop_loss_day());
    write(dir.path(), "b.csv", "time,open,high,low,close,ema,rsi\n");
    write(dir.path(), "c.csv", &quiet_day());
    write(dir.path(), "notes.txt", "ignored");

    let files = list_day_files(dir.path()).unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.csv", "b.csv", "c.csv"]);

    let results = run_days(&files, &RunConfig::default());
    assert_eq!(results.len(), 3);
    assert!(results[0].1.is_ok());
    assert!(matches!(results[1].1, Err(RunError::Replay { .. })));
    assert!(results[2].1.is_ok());

    let days: Vec<_> = results.into_iter().filter_map(|(_, r)| r.ok()).collect();
    let total = aggregate(&days);
    assert_eq!(total.trade_count, 1);
    assert_eq!(total.stop_losses, 1);
}

#[test]
fn test_empty_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        list_day_files(dir.path()),
        Err(LoadError::NoDayFiles(_))
    ));
}

#[test]
fn test_missing_file_is_a_data_error() {
    let err = run_day(Path::new("/nonexistent/day.csv"), &RunConfig::default()).unwrap_err();
    assert!(matches!(err, RunError::Data(LoadError::Io { .. })));
}
