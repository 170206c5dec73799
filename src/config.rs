//! Run configuration, loaded from an optional TOML file.

use crate::models::{Distribution, DistributionError, Morphology, MutationRate};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "tuner.toml";

/// What a resumed run does with the serial id sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerialPolicy {
    /// Carry on after the highest id found in the snapshot.
    #[default]
    Continue,
    /// Start again from 1.
    Reset,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Parse error in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("population_size must be at least 2, got {0}")]
    PopulationTooSmall(usize),
    #[error("generations must be at least 1")]
    NoGenerations,
    #[error("initial distribution: {0}")]
    Distribution(#[from] DistributionError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TunerConfig {
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Last generation to score; a run stops after it.
    #[serde(default = "default_generations")]
    pub generations: u32,
    #[serde(default)]
    pub mutation_rate: MutationRate,
    #[serde(default)]
    pub morphology: Morphology,
    #[serde(default = "default_best_log")]
    pub best_log: PathBuf,
    /// Fixed seed for a reproducible run.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub serial_policy: SerialPolicy,
    #[serde(default)]
    pub initial: Distribution,
}

fn default_population_size() -> usize {
    5
}
fn default_generations() -> u32 {
    12
}
fn default_best_log() -> PathBuf {
    PathBuf::from("best_chromosomes.jsonl")
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            generations: default_generations(),
            mutation_rate: MutationRate::default(),
            morphology: Morphology::default(),
            best_log: default_best_log(),
            seed: None,
            serial_policy: SerialPolicy::default(),
            initial: Distribution::default(),
        }
    }
}

impl TunerConfig {
    /// Reads `path`. When `required` is false a missing file yields the defaults.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size < 2 {
            return Err(ConfigError::PopulationTooSmall(self.population_size));
        }
        if self.generations == 0 {
            return Err(ConfigError::NoGenerations);
        }
        self.initial.validate(self.morphology)?;
        Ok(())
    }
}
