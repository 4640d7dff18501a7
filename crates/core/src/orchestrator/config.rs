//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{Config, GenerationConfig};

/// Settings the orchestrator needs from the wider config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// GPU tokens claimed per job.
    pub tokens: u32,
    /// Fixed generation parameters and the polling schedule.
    pub generation: GenerationConfig,
    /// Where uploads are copied while a job runs.
    pub temp_dir: PathBuf,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for OrchestratorConfig {
    fn from(config: &Config) -> Self {
        Self {
            tokens: config.queue.tokens,
            generation: config.generation.clone(),
            temp_dir: config.probe.temp_dir.clone(),
        }
    }
}
