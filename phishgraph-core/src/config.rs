use crate::error::{FeatureError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_MAX_WORDS: usize = 50;
pub const DEFAULT_MAX_NODES: usize = 200;
pub const DEFAULT_VOCAB_SIZE: usize = 10_000;

/// Output dimensions of the feature pipeline.
///
/// These must match the values the model was trained with. A mismatch does
/// not fail at inference time, it silently shifts the inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_words: usize,
    pub max_nodes: usize,
    pub vocab_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_words: DEFAULT_MAX_WORDS,
            max_nodes: DEFAULT_MAX_NODES,
            vocab_size: DEFAULT_VOCAB_SIZE,
        }
    }
}

impl PipelineConfig {
    pub fn with_max_words(mut self, max_words: usize) -> Self {
        self.max_words = max_words;
        self
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn with_vocab_size(mut self, vocab_size: usize) -> Self {
        self.vocab_size = vocab_size;
        self
    }

    /// Reject zero-sized dimensions.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("max_words", self.max_words),
            ("max_nodes", self.max_nodes),
            ("vocab_size", self.vocab_size),
        ] {
            if value == 0 {
                return Err(FeatureError::ConfigError(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Load a configuration from a JSON file. Missing fields take their
    /// defaults; the result is validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}
