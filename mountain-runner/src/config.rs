//! Serializable run configuration, loaded from TOML.
//!
//! ```toml
//! [run]
//! instrument = "NIFTY"
//! output_dir = "results"
//!
//! [strategy]
//! ema_period = 5
//! lot_multiplier = 50.0
//! forced_exit_time = "15:15:00"
//! ```
//!
//! Every key is optional; missing keys take the strategy defaults.

use mountain_core::StrategyConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid strategy: {0}")]
    Strategy(#[from] mountain_core::ConfigError),
}

/// Everything needed to reproduce a replay or a batch of replays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub run: RunSection,
    #[serde(default)]
    pub strategy: StrategyConfig,
}

/// Output and labelling options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSection {
    /// Label carried into results and artifact directory names.
    pub instrument: String,
    pub output_dir: PathBuf,
    /// Also write `events.csv` and `trades.csv` next to the JSON result.
    pub export_csv: bool,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            instrument: "NIFTY".to_string(),
            output_dir: PathBuf::from("results"),
            export_csv: true,
        }
    }
}

impl RunConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.strategy.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Deterministic hash ID of this configuration.
    pub fn run_id(&self) -> String {
        let json = serde_json::to_string(self).expect("RunConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = RunConfig::from_toml("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.strategy.lot_multiplier, 50.0);
        assert_eq!(config.run.instrument, "NIFTY");
    }

    #[test]
    fn test_partial_sections_override_defaults() {
        let config = RunConfig::from_toml(
            r#"
[run]
instrument = "BANKNIFTY"
export_csv = false

[strategy]
lot_multiplier = 15.0
forced_exit_time = "15:00:00"
"#,
        )
        .unwrap();
        assert_eq!(config.run.instrument, "BANKNIFTY");
        assert!(!config.run.export_csv);
        assert_eq!(config.run.output_dir, PathBuf::from("results"));
        assert_eq!(config.strategy.lot_multiplier, 15.0);
        assert_eq!(
            config.strategy.forced_exit_time,
            NaiveTime::from_hms_opt(15, 0, 0).unwrap()
        );
        assert_eq!(config.strategy.ema_period, 5);
    }

    #[test]
    fn test_invalid_strategy_is_rejected() {
        let err = RunConfig::from_toml("[strategy]\nema_period = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Strategy(mountain_core::ConfigError::ZeroEmaPeriod)
        ));
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        assert!(matches!(
            RunConfig::from_toml("[strategy\nema_period = 5"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_run_id_is_deterministic_and_param_sensitive() {
        let a = RunConfig::default();
        let mut b = RunConfig::default();
        assert_eq!(a.run_id(), b.run_id());
        b.strategy.lot_multiplier = 25.0;
        assert_ne!(a.run_id(), b.run_id());
    }
}
