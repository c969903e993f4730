use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::PmotifError;
use crate::pipeline::metric_pipeline::DEFAULT_CHUNK_SIZE;
use crate::randomization::RandomizationConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub graphlet_size: usize,
    /// Number of randomized graphs in the null model.
    pub random_graphs: usize,
    pub randomization: RandomizationConfig,
    /// Threads used for ensemble members.
    pub workers: usize,
    /// Occurrences per parallel metric task.
    pub occurrence_chunk_size: usize,
    pub scanner_executable: PathBuf,
    pub directed: bool,
    /// Significance level of the positional tests.
    pub alpha: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            graphlet_size: 3,
            random_graphs: 10,
            randomization: RandomizationConfig::default(),
            workers: 8,
            occurrence_chunk_size: DEFAULT_CHUNK_SIZE,
            scanner_executable: PathBuf::from("bin/gtrieScanner/gtrieScanner"),
            directed: false,
            alpha: 0.05,
        }
    }
}

impl DetectionConfig {
    /// Read a JSON config; absent fields keep their defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("open config {:?}", path))?;
        let config: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parse config {:?}", path))?;
        config
            .validate()
            .with_context(|| format!("validate config {:?}", path))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PmotifError> {
        if self.graphlet_size < 3 {
            return Err(PmotifError::Config(format!(
                "graphlet_size must be at least 3, got {}",
                self.graphlet_size
            )));
        }
        if self.workers == 0 {
            return Err(PmotifError::Config("workers must be positive".to_string()));
        }
        if self.occurrence_chunk_size == 0 {
            return Err(PmotifError::Config(
                "occurrence_chunk_size must be positive".to_string(),
            ));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(PmotifError::Config(format!(
                "alpha must lie in (0, 1), got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}
