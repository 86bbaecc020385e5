//! Run fingerprinting: content hashes that identify a replay's inputs and output.
//!
//! Hashes are BLAKE3 over the canonical JSON of each value. Struct fields
//! serialize in declaration order, so the JSON (and the hash) is stable across
//! runs and platforms.

use crate::config::StrategyConfig;
use crate::domain::{CandleSeries, EventLog};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex-encoded BLAKE3 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(pub String);

impl ContentHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// Hash the canonical JSON of `value`.
    pub fn of<T: Serialize>(value: &T) -> Self {
        let json = serde_json::to_vec(value).expect("fingerprinted values always serialize");
        Self::from_bytes(&json)
    }

    /// First 12 hex characters, for logs and file names.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one replay: what went in and what came out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub dataset_hash: ContentHash,
    pub config_hash: ContentHash,
    pub events_hash: ContentHash,
}

impl RunFingerprint {
    pub fn compute(series: &CandleSeries, config: &StrategyConfig, events: &EventLog) -> Self {
        Self::with_dataset_hash(ContentHash::of(series), config, events)
    }

    /// Build a fingerprint around a dataset hash taken when the series was loaded.
    pub fn with_dataset_hash(
        dataset_hash: ContentHash,
        config: &StrategyConfig,
        events: &EventLog,
    ) -> Self {
        Self {
            dataset_hash,
            config_hash: ContentHash::of(config),
            events_hash: ContentHash::of(events),
        }
    }

    /// True if both runs saw the same candles under the same configuration.
    pub fn same_inputs(&self, other: &Self) -> bool {
        self.dataset_hash == other.dataset_hash && self.config_hash == other.config_hash
    }
}
