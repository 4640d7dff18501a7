//! Scoped hold on GPU tokens and the loaded model.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::backend::BackendClient;
use crate::job::SessionId;
use crate::metrics::COMPENSATION_FAILURES;
use crate::queue::{QueueClient, QueueError};

/// Tokens claimed from the queue for one job.
///
/// Once acquired, the lease must end with [`GpuLease::release`], which
/// unloads the model and hands the tokens back. A lease dropped without
/// being released (the owning future was cancelled) spawns the same
/// compensation onto the current runtime.
///
/// Both the claim and the compensation run on their own tasks, so
/// cancelling the caller mid-await never strands a granted session.
pub(crate) struct GpuLease {
    session: SessionId,
    queue: Arc<dyn QueueClient>,
    backend: Arc<dyn BackendClient>,
    released: bool,
}

impl GpuLease {
    /// Claim `tokens` under a freshly generated session.
    ///
    /// If the caller goes away after the queue grants the tokens, the lease
    /// built on the claim task is dropped there and compensates.
    pub(crate) async fn acquire(
        queue: Arc<dyn QueueClient>,
        backend: Arc<dyn BackendClient>,
        tokens: u32,
    ) -> Result<Self, QueueError> {
        let session = SessionId::generate();

        let claim = tokio::spawn(async move {
            queue.acquire(&session, tokens).await?;
            info!(session_id = %session, tokens, "GPU tokens acquired");

            Ok::<_, QueueError>(Self {
                session,
                queue,
                backend,
                released: false,
            })
        });

        match claim.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(QueueError::Unreachable(format!("token claim aborted: {}", e))),
        }
    }

    pub(crate) fn session(&self) -> &SessionId {
        &self.session
    }

    /// Unload the model and release the tokens. Failures are logged only.
    pub(crate) async fn release(mut self) {
        self.released = true;
        let task = self.spawn_compensation();

        if let Err(e) = task.await {
            error!(session_id = %self.session, error = %e, "Compensation task failed");
        }
    }

    fn spawn_compensation(&self) -> JoinHandle<()> {
        tokio::spawn(compensate(
            Arc::clone(&self.backend),
            Arc::clone(&self.queue),
            self.session.clone(),
        ))
    }
}

impl Drop for GpuLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        warn!(
            session_id = %self.session,
            "GPU lease dropped without release, compensating in background"
        );

        if tokio::runtime::Handle::try_current().is_ok() {
            self.spawn_compensation();
        } else {
            error!(
                session_id = %self.session,
                "No runtime available, GPU tokens and model were not released"
            );
        }
    }
}

async fn compensate(
    backend: Arc<dyn BackendClient>,
    queue: Arc<dyn QueueClient>,
    session: SessionId,
) {
    if let Err(e) = backend.unload_model().await {
        warn!(session_id = %session, action = "unload", error = %e, "Model unload failed");
        COMPENSATION_FAILURES.with_label_values(&["unload"]).inc();
    }

    if let Err(e) = queue.release(&session).await {
        warn!(session_id = %session, action = "release", error = %e, "GPU token release failed");
        COMPENSATION_FAILURES.with_label_values(&["release"]).inc();
    } else {
        info!(session_id = %session, "GPU tokens released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBackend, MockQueueClient};
    use std::time::Duration;

    async fn wait_for_release(queue: &MockQueueClient) {
        for _ in 0..100 {
            if !queue.released().await.is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_release_compensates_once() {
        let queue = Arc::new(MockQueueClient::new());
        let backend = Arc::new(MockBackend::new());

        let lease = GpuLease::acquire(queue.clone(), backend.clone(), 10)
            .await
            .unwrap();
        let session = lease.session().clone();
        lease.release().await;

        assert_eq!(queue.acquired().await, vec![(session.clone(), 10)]);
        assert_eq!(queue.released().await, vec![session]);
        assert_eq!(backend.unload_count().await, 1);
    }

    #[tokio::test]
    async fn test_dropped_lease_compensates_in_background() {
        let queue = Arc::new(MockQueueClient::new());
        let backend = Arc::new(MockBackend::new());

        let lease = GpuLease::acquire(queue.clone(), backend.clone(), 10)
            .await
            .unwrap();
        let session = lease.session().clone();
        drop(lease);
        wait_for_release(&queue).await;

        assert_eq!(queue.released().await, vec![session]);
        assert_eq!(backend.unload_count().await, 1);
    }

    #[tokio::test]
    async fn test_compensation_failures_are_swallowed() {
        let queue = Arc::new(MockQueueClient::new());
        let backend = Arc::new(MockBackend::new());
        backend.set_unload_fails(true).await;
        queue.set_release_fails(true).await;

        let lease = GpuLease::acquire(queue.clone(), backend.clone(), 1)
            .await
            .unwrap();
        lease.release().await;

        assert_eq!(backend.unload_count().await, 1);
        assert_eq!(queue.released().await.len(), 1);
    }

    #[tokio::test]
    async fn test_refused_acquire_yields_no_lease() {
        let queue = Arc::new(MockQueueClient::new());
        let backend = Arc::new(MockBackend::new());
        queue.set_refuse(true).await;

        let result = GpuLease::acquire(queue.clone(), backend.clone(), 1).await;
        assert!(matches!(result, Err(QueueError::Refused { .. })));
        assert!(queue.released().await.is_empty());
        assert_eq!(backend.unload_count().await, 0);
    }

    #[tokio::test]
    async fn test_cancelled_release_still_returns_tokens() {
        let queue = Arc::new(MockQueueClient::new());
        let backend = Arc::new(MockBackend::new());
        backend.set_unload_delay(Duration::from_millis(200)).await;

        let lease = GpuLease::acquire(queue.clone(), backend.clone(), 10)
            .await
            .unwrap();
        let session = lease.session().clone();

        let cut_short = tokio::time::timeout(Duration::from_millis(50), lease.release()).await;
        assert!(cut_short.is_err());
        assert!(queue.released().await.is_empty());

        wait_for_release(&queue).await;
        assert_eq!(queue.released().await, vec![session]);
        assert_eq!(backend.unload_count().await, 1);
    }

    #[tokio::test]
    async fn test_cancelled_acquire_returns_granted_tokens() {
        let queue = Arc::new(MockQueueClient::new());
        let backend = Arc::new(MockBackend::new());
        queue.set_acquire_delay(Duration::from_millis(100)).await;

        let cut_short = tokio::time::timeout(
            Duration::from_millis(20),
            GpuLease::acquire(queue.clone(), backend.clone(), 10),
        )
        .await;
        assert!(cut_short.is_err());

        wait_for_release(&queue).await;
        let acquired = queue.acquired().await;
        assert_eq!(acquired.len(), 1);
        assert_eq!(queue.released().await, vec![acquired[0].0.clone()]);
        assert_eq!(backend.unload_count().await, 1);
    }
}
