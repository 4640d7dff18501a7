//! Mock GPU queue client for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::job::SessionId;
use crate::queue::{QueueClient, QueueError};

/// Mock implementation of the QueueClient trait.
///
/// Records every acquire and release so tests can check pairing, and can
/// be told to refuse, be unreachable, or fail releases.
///
/// # Example
///
/// ```rust,ignore
/// use lego_core::testing::MockQueueClient;
///
/// let queue = MockQueueClient::new();
/// queue.set_refuse(true).await;
///
/// // ...run a job...
///
/// assert_eq!(queue.acquired().await.len(), 1);
/// assert!(queue.released().await.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MockQueueClient {
    acquired: Arc<RwLock<Vec<(SessionId, u32)>>>,
    released: Arc<RwLock<Vec<SessionId>>>,
    refuse: Arc<RwLock<bool>>,
    unreachable: Arc<RwLock<bool>>,
    release_fails: Arc<RwLock<bool>>,
    acquire_delay: Arc<RwLock<Option<Duration>>>,
}

impl MockQueueClient {
    /// Create a mock queue that grants every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer acquire requests with HTTP 429.
    pub async fn set_refuse(&self, refuse: bool) {
        *self.refuse.write().await = refuse;
    }

    /// Fail acquire requests as if the service were down.
    pub async fn set_unreachable(&self, unreachable: bool) {
        *self.unreachable.write().await = unreachable;
    }

    /// Fail release requests (after recording them).
    pub async fn set_release_fails(&self, fails: bool) {
        *self.release_fails.write().await = fails;
    }

    /// Hold every acquire for `delay` before answering.
    pub async fn set_acquire_delay(&self, delay: Duration) {
        *self.acquire_delay.write().await = Some(delay);
    }

    /// Every acquire call with its session and token count, refused or not.
    pub async fn acquired(&self) -> Vec<(SessionId, u32)> {
        self.acquired.read().await.clone()
    }

    /// Every release call, failed or not.
    pub async fn released(&self) -> Vec<SessionId> {
        self.released.read().await.clone()
    }
}

#[async_trait]
impl QueueClient for MockQueueClient {
    async fn acquire(&self, session: &SessionId, tokens: u32) -> Result<(), QueueError> {
        self.acquired.write().await.push((session.clone(), tokens));

        let delay = *self.acquire_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if *self.unreachable.read().await {
            return Err(QueueError::Unreachable("connection refused".to_string()));
        }
        if *self.refuse.read().await {
            return Err(QueueError::Refused { status: 429 });
        }
        Ok(())
    }

    async fn release(&self, session: &SessionId) -> Result<(), QueueError> {
        self.released.write().await.push(session.clone());

        if *self.release_fails.read().await {
            return Err(QueueError::Unreachable("connection reset".to_string()));
        }
        Ok(())
    }
}
