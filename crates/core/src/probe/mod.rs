//! Audio duration probing.
//!
//! The backend needs the length of the context audio up front, so every
//! upload is probed before any GPU resource is claimed.

mod ffprobe;

pub use ffprobe::FfprobeProbe;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while probing a file.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// FFprobe ran but reported an error.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// FFprobe did not finish in time.
    #[error("FFprobe timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// FFprobe output did not contain a usable duration.
    #[error("No usable duration in ffprobe output: '{output}'")]
    NoDuration { output: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that can tell how long an audio file is.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Duration of the file at `path`, in seconds.
    async fn duration_secs(&self, path: &Path) -> Result<f64, ProbeError>;
}
