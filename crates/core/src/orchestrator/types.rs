//! Types for the job orchestrator.

use thiserror::Error;

/// Caller-visible failure of a lego job.
#[derive(Debug, Clone, Error)]
pub enum JobError {
    /// The request itself is unusable. Nothing was acquired.
    #[error("{0}")]
    ClientError(String),

    /// The GPU queue refused or could not be reached. Nothing was acquired.
    #[error("GPU queue unavailable: {0}")]
    ResourceUnavailable(String),

    /// The backend failed or reported a failed generation.
    #[error("{0}")]
    UpstreamFailure(String),

    /// The generation did not finish before the deadline.
    #[error("ACE-Step generation timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Local failure unrelated to the request or the upstream services.
    #[error("internal error: {0}")]
    Internal(String),
}

impl JobError {
    /// HTTP status code the error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            JobError::ClientError(_) => 400,
            JobError::ResourceUnavailable(_) => 503,
            JobError::UpstreamFailure(_) => 502,
            JobError::Timeout { .. } => 504,
            JobError::Internal(_) => 500,
        }
    }

    /// Label used for the outcome metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            JobError::ClientError(_) => "client_error",
            JobError::ResourceUnavailable(_) => "unavailable",
            JobError::UpstreamFailure(_) => "upstream_failure",
            JobError::Timeout { .. } => "timeout",
            JobError::Internal(_) => "internal",
        }
    }
}
