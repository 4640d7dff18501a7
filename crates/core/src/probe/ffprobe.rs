//! FFprobe-based duration probe.

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use crate::config::ProbeConfig;

use super::{DurationProbe, ProbeError};

/// Runs `ffprobe -show_entries format=duration` on the file.
pub struct FfprobeProbe {
    config: ProbeConfig,
}

impl FfprobeProbe {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    fn build_args(path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-show_entries".to_string(),
            "format=duration".to_string(),
            "-of".to_string(),
            "csv=p=0".to_string(),
            path.to_string_lossy().to_string(),
        ]
    }

    /// Parses the single-value csv output, e.g. `"30.013333\n"`.
    fn parse_duration(output: &str) -> Result<f64, ProbeError> {
        let trimmed = output.trim();
        match trimmed.parse::<f64>() {
            Ok(secs) if secs.is_finite() && secs > 0.0 => Ok(secs),
            _ => Err(ProbeError::NoDuration {
                output: trimmed.to_string(),
            }),
        }
    }
}

#[async_trait]
impl DurationProbe for FfprobeProbe {
    async fn duration_secs(&self, path: &Path) -> Result<f64, ProbeError> {
        let run = Command::new(&self.config.ffprobe_path)
            .args(Self::build_args(path))
            .kill_on_drop(true)
            .output();

        let output = timeout(Duration::from_secs(self.config.timeout_secs), run)
            .await
            .map_err(|_| ProbeError::Timeout {
                timeout_secs: self.config.timeout_secs,
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProbeError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    ProbeError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ProbeError::ProbeFailed {
                reason: format!(
                    "ffprobe exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Self::parse_duration(&String::from_utf8_lossy(&output.stdout))
    }
}
