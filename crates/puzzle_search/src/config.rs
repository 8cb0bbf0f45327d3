//! Run configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! standard search: depth 6, oracle depth 8, five survivors per move class.
//!
//! ```toml
//! [search]
//! max_depth = 6
//! survivor_bias = "lowest"
//!
//! [oracle]
//! program = "stockfish"
//! depth = 10
//!
//! [heuristics]
//! pin_constant = 21.0
//! ```

use std::path::Path;

use puzzle_core::HeuristicConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which end of the ranking survives when a move class has too many
/// candidates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurvivorBias {
    /// Keep the candidates with the smallest heuristic total.
    #[default]
    Lowest,
    /// Keep the candidates with the largest heuristic total.
    Highest,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search stops once this depth is reached; depths 1..max_depth are expanded.
    pub max_depth: usize,
    /// Depths below this one must clear `shallow_threshold`.
    pub shallow_depth: usize,
    /// Minimum heuristic total at shallow depths.
    pub shallow_threshold: f64,
    /// Cap on survivors per move class, per expanded position.
    pub max_survivors_per_class: usize,
    pub survivor_bias: SurvivorBias,
    /// Keep only forced mates for the mover when any candidate has one,
    /// otherwise drop dead-level scores.
    pub prefer_mates: bool,
    /// Headline puzzles drawn per move class.
    pub headline_per_class: usize,
    /// Headline puzzles come from strictly deeper than this.
    pub headline_min_depth: usize,
    /// Parallel oracle sessions. 1 runs the search on the calling thread.
    pub concurrency: usize,
    /// Seed for headline sampling; random when unset.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            shallow_depth: 3,
            shallow_threshold: 0.1,
            max_survivors_per_class: 5,
            survivor_bias: SurvivorBias::Lowest,
            prefer_mates: true,
            headline_per_class: 2,
            headline_min_depth: 2,
            concurrency: 1,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// UCI engine executable.
    pub program: String,
    /// Extra command-line arguments for the engine.
    pub args: Vec<String>,
    /// Fixed search depth per query, in plies.
    pub depth: u32,
    pub hash_mb: u32,
    pub threads: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            program: "stockfish".to_string(),
            args: Vec::new(),
            depth: 8,
            hash_mb: 64,
            threads: 1,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleConfig {
    pub search: SearchConfig,
    pub oracle: OracleConfig,
    pub heuristics: HeuristicConfig,
}

impl PuzzleConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: PuzzleConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.max_depth == 0 {
            return Err(ConfigError::Invalid("search.max_depth must be at least 1".into()));
        }
        if self.search.concurrency == 0 {
            return Err(ConfigError::Invalid("search.concurrency must be at least 1".into()));
        }
        if self.oracle.program.trim().is_empty() {
            return Err(ConfigError::Invalid("oracle.program is empty".into()));
        }
        if self.heuristics.sacrifice_constants.is_empty() {
            return Err(ConfigError::Invalid("heuristics.sacrifice_constants is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
