//! ACE-Step backend integration.
//!
//! The backend owns the model and does the actual generation. The wrapper
//! only drives its lifecycle over HTTP:
//!
//! - `POST /v1/load` / `POST /v1/unload` move the model in and out of GPU memory
//! - `POST /release_task` submits a lego task and returns a task id
//! - `POST /query_result` reports task status (0 pending, 1 done, 2 failed)
//! - `GET <file>` downloads a generated file

mod http;
mod types;

pub use http::HttpBackend;
pub use types::{first_output_file, SubmitTask, TaskId, TaskStatus};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("ACE-Step {endpoint} failed: HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Backend answered with a payload we could not understand.
    #[error("Failed to parse ACE-Step response: {0}")]
    ParseError(String),

    /// Reading the local input audio failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::ParseError(reason.into())
    }
}

/// Client for the ACE-Step api server.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Load the model onto the GPU.
    async fn load_model(&self) -> Result<(), BackendError>;

    /// Unload the model from the GPU.
    async fn unload_model(&self) -> Result<(), BackendError>;

    /// Submit a lego generation task.
    async fn submit(&self, task: &SubmitTask) -> Result<TaskId, BackendError>;

    /// Query the current status of a task.
    async fn query_status(&self, task_id: &TaskId) -> Result<TaskStatus, BackendError>;

    /// Download a generated file by the path reported in the task result.
    async fn fetch_file(&self, path: &str) -> Result<Vec<u8>, BackendError>;

    /// Whether the backend answers its health endpoint.
    async fn is_healthy(&self) -> bool;
}
