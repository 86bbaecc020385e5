//! Day-file loading for the runner.
//!
//! A day file is a CSV with header `time,open,high,low,close,ema,rsi`, one row
//! per closed candle in time order. `ema` and `rsi` cells may be blank where the
//! indicator service had no value; a blank cell is read as missing, never as zero.

use chrono::NaiveDateTime;
use mountain_core::{CandleSeries, ContentHash, RawCandle, SeriesError};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Timestamp layouts accepted in the `time` column.
const TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: cannot parse time '{value}'")]
    BadTime { row: usize, value: String },
    #[error("invalid candle series: {0}")]
    Series(#[from] SeriesError),
    #[error("no .csv day files in {0}")]
    NoDayFiles(PathBuf),
}

/// One parsed day, ready to replay.
#[derive(Debug, Clone)]
pub struct LoadedDay {
    /// File stem, used as the day label.
    pub name: String,
    pub series: CandleSeries,
    pub dataset_hash: ContentHash,
}

#[derive(Debug, Deserialize)]
struct DayRow {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    ema: Option<f64>,
    rsi: Option<f64>,
}

/// Parse a day from any CSV reader.
pub fn parse_day<R: Read>(reader: R) -> Result<CandleSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut bars = Vec::new();
    let mut ema = Vec::new();
    let mut rsi = Vec::new();
    for (row, record) in rdr.deserialize::<DayRow>().enumerate() {
        let record = record?;
        bars.push(RawCandle {
            time: parse_time(&record.time).ok_or_else(|| LoadError::BadTime {
                row,
                value: record.time.clone(),
            })?,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
        });
        ema.push(record.ema);
        rsi.push(record.rsi);
    }

    Ok(CandleSeries::from_parts(&bars, &ema, &rsi)?)
}

fn parse_time(value: &str) -> Option<NaiveDateTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Load one day file and fingerprint its contents.
pub fn load_day(path: &Path) -> Result<LoadedDay, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let series = parse_day(file)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(LoadedDay {
        name,
        dataset_hash: ContentHash::of(&series),
        series,
    })
}

/// All `.csv` files directly inside `dir`, sorted by name.
pub fn list_day_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| LoadError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(LoadError::NoDayFiles(dir.to_path_buf()));
    }
    files.sort();
    Ok(files)
}
