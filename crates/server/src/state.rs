use std::sync::Arc;
use lego_core::{BackendClient, Config, JobOrchestrator};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<JobOrchestrator>,
    backend: Arc<dyn BackendClient>,
}

impl AppState {
    pub fn new(
        config: Config,
        orchestrator: Arc<JobOrchestrator>,
        backend: Arc<dyn BackendClient>,
    ) -> Self {
        Self {
            config,
            orchestrator,
            backend,
        }
    }

    pub fn orchestrator(&self) -> Arc<JobOrchestrator> {
        Arc::clone(&self.orchestrator)
    }

    pub fn backend(&self) -> &dyn BackendClient {
        self.backend.as_ref()
    }

    /// Backend URL as reported by the health endpoint.
    pub fn backend_url(&self) -> &str {
        self.config.backend.base_url()
    }

    pub fn default_batch_size(&self) -> u32 {
        self.config.generation.default_batch_size
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.config.server.max_upload_bytes
    }
}
