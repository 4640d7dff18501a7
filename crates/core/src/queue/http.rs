//! HTTP client for the gpu-queue-service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::QueueConfig;
use crate::job::SessionId;

use super::{QueueClient, QueueError};

#[derive(Serialize)]
struct CreateTaskBody<'a> {
    session_id: &'a str,
    tokens: u32,
}

#[derive(Serialize)]
struct TaskStatusBody<'a> {
    session_id: &'a str,
    status: &'a str,
}

/// Queue client speaking the gpu-queue-service REST API.
pub struct HttpQueueClient {
    client: Client,
    config: QueueConfig,
}

impl HttpQueueClient {
    pub fn new(client: Client, config: QueueConfig) -> Self {
        Self { client, config }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url(), endpoint)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }
}

#[async_trait]
impl QueueClient for HttpQueueClient {
    async fn acquire(&self, session: &SessionId, tokens: u32) -> Result<(), QueueError> {
        debug!(session_id = %session, tokens, "Requesting GPU tokens");

        let response = self
            .client
            .post(self.url("/tasks"))
            .json(&CreateTaskBody {
                session_id: session.as_str(),
                tokens,
            })
            .timeout(self.timeout())
            .send()
            .await?;

        match response.status().as_u16() {
            200 | 201 => Ok(()),
            status => Err(QueueError::Refused { status }),
        }
    }

    async fn release(&self, session: &SessionId) -> Result<(), QueueError> {
        debug!(session_id = %session, "Releasing GPU tokens");

        let response = self
            .client
            .post(self.url("/task/status"))
            .json(&TaskStatusBody {
                session_id: session.as_str(),
                status: "completed",
            })
            .timeout(self.timeout())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(QueueError::Refused {
                status: status.as_u16(),
            })
        }
    }
}
