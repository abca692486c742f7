use crate::errors::{BenchError, BenchResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SIZES: [usize; 3] = [10_000, 50_000, 100_000];
pub const DEFAULT_REPEATS: usize = 5;
pub const DEFAULT_SEED: u64 = 0;
pub const DEFAULT_MISSING_RATE: f64 = 0.10;
pub const DEFAULT_PROFILE_ROWS: usize = 100_000;
pub const DEFAULT_PROFILE_TOP: usize = 25;

/// Benchmark run configuration.
///
/// Every field has a default, so an empty YAML document (or no config at all)
/// yields the standard three-size run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchConfig {
    #[serde(default = "default_sizes")]
    pub sizes: Vec<usize>,
    #[serde(default = "default_repeats")]
    pub repeats: usize,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_missing_rate")]
    pub missing_rate: f64,
}

fn default_sizes() -> Vec<usize> {
    DEFAULT_SIZES.to_vec()
}

fn default_repeats() -> usize {
    DEFAULT_REPEATS
}

fn default_missing_rate() -> f64 {
    DEFAULT_MISSING_RATE
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            sizes: default_sizes(),
            repeats: DEFAULT_REPEATS,
            seed: DEFAULT_SEED,
            missing_rate: DEFAULT_MISSING_RATE,
        }
    }
}

impl BenchConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> BenchResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> BenchResult<Self> {
        // An empty document deserializes to unit, not to a map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: BenchConfig = serde_yaml::from_str(content).map_err(|e| {
            let span = e
                .location()
                .map(|loc| miette::SourceSpan::from((loc.index(), 1)));
            BenchError::ConfigError(e.to_string(), span)
        })?;
        Ok(config)
    }

    pub fn validate(&self) -> BenchResult<()> {
        if self.sizes.is_empty() {
            return Err(BenchError::config("at least one dataset size is required"));
        }
        if self.sizes.contains(&0) {
            return Err(BenchError::config("dataset sizes must be positive"));
        }
        if self.repeats == 0 {
            return Err(BenchError::config("repeats must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.missing_rate) {
            return Err(BenchError::config(format!(
                "missing_rate must be within [0, 1), got {}",
                self.missing_rate
            )));
        }
        Ok(())
    }
}

/// Settings for the one-shot profiling run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileConfig {
    pub rows: usize,
    pub seed: u64,
    pub top: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_PROFILE_ROWS,
            seed: DEFAULT_SEED,
            top: DEFAULT_PROFILE_TOP,
        }
    }
}
