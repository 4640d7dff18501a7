//! GPU queue service integration.
//!
//! The queue service arbitrates shared GPU capacity. A job claims a fixed
//! number of tokens under a session id before touching the GPU and marks the
//! session completed afterwards, which returns the tokens to the pool.

mod http;

pub use http::HttpQueueClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::job::SessionId;

/// Errors that can occur when talking to the queue service.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue answered but did not grant the tokens.
    #[error("Queue refused the request: HTTP {status}")]
    Refused { status: u16 },

    /// Connection failed or timed out.
    #[error("Queue service unreachable: {0}")]
    Unreachable(String),
}

impl From<reqwest::Error> for QueueError {
    fn from(e: reqwest::Error) -> Self {
        QueueError::Unreachable(e.to_string())
    }
}

/// Client for the GPU queue service.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Claim `tokens` GPU tokens for `session`.
    async fn acquire(&self, session: &SessionId, tokens: u32) -> Result<(), QueueError>;

    /// Mark `session` completed, releasing its tokens.
    async fn release(&self, session: &SessionId) -> Result<(), QueueError>;
}
