//! Mountain Runner: day-file loading, replay orchestration, batch runs and export.
//!
//! This crate builds on `mountain-core` to provide:
//! - TOML run configuration
//! - CSV day-file loading with null-aware indicator columns
//! - Single-day and parallel multi-day replay with structured logging
//! - JSON and CSV artifacts with schema versioning

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;

pub use config::{ConfigError, RunConfig, RunSection};
pub use data_loader::{list_day_files, load_day, parse_day, LoadError, LoadedDay};
pub use export::{
    export_events_csv, export_history_csv, export_json, import_json, load_artifacts,
    save_artifacts,
};
pub use runner::{aggregate, run_day, run_days, run_series, DayResult, RunError, SCHEMA_VERSION};
