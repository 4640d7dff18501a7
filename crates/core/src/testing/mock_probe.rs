//! Mock duration probe for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::probe::{DurationProbe, ProbeError};

/// A recorded probe call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedProbe {
    /// Path that was probed.
    pub path: PathBuf,
    /// Whether the file existed when it was probed.
    pub existed: bool,
    /// Bytes in the file at probe time.
    pub size_bytes: u64,
}

/// Mock implementation of the DurationProbe trait.
///
/// Reports a fixed duration (30 seconds by default) and remembers which
/// files it was asked about, so tests can check the temp file lifecycle.
#[derive(Debug)]
pub struct MockDurationProbe {
    duration_secs: Arc<RwLock<Option<f64>>>,
    probes: Arc<RwLock<Vec<RecordedProbe>>>,
}

impl Default for MockDurationProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDurationProbe {
    /// Create a probe reporting 30 seconds for every file.
    pub fn new() -> Self {
        Self {
            duration_secs: Arc::new(RwLock::new(Some(30.0))),
            probes: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Set the reported duration; `None` makes every probe fail.
    pub async fn set_duration(&self, duration_secs: Option<f64>) {
        *self.duration_secs.write().await = duration_secs;
    }

    /// All probe calls so far.
    pub async fn recorded_probes(&self) -> Vec<RecordedProbe> {
        self.probes.read().await.clone()
    }
}

#[async_trait]
impl DurationProbe for MockDurationProbe {
    async fn duration_secs(&self, path: &Path) -> Result<f64, ProbeError> {
        let metadata = tokio::fs::metadata(path).await.ok();
        self.probes.write().await.push(RecordedProbe {
            path: path.to_path_buf(),
            existed: metadata.is_some(),
            size_bytes: metadata.map(|m| m.len()).unwrap_or(0),
        });

        match *self.duration_secs.read().await {
            Some(secs) => Ok(secs),
            None => Err(ProbeError::NoDuration {
                output: "N/A".to_string(),
            }),
        }
    }
}
