//! HTTP client for the ACE-Step api server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::BackendConfig;

use super::{BackendClient, BackendError, SubmitTask, TaskId, TaskStatus};

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    data: SubmitData,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    task_id: Value,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    data: Vec<QueryItem>,
}

#[derive(Debug, Deserialize)]
struct QueryItem {
    status: i64,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Backend client speaking the ACE-Step REST API.
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(client: Client, config: BackendConfig) -> Self {
        Self { client, config }
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url()
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url(), endpoint)
        } else {
            format!("{}/{}", self.base_url(), endpoint)
        }
    }

    /// Attach the bearer credential when an API key is configured.
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.api_key() {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Turn a non-200 response into a `Status` error carrying the body text.
    async fn expect_ok(endpoint: &str, response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.as_u16() == 200 {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl BackendClient for HttpBackend {
    async fn load_model(&self) -> Result<(), BackendError> {
        let response = self
            .authorized(self.client.post(self.url("/v1/load")))
            .timeout(Duration::from_secs(self.config.load_timeout_secs))
            .send()
            .await?;
        Self::expect_ok("/v1/load", response).await?;
        Ok(())
    }

    async fn unload_model(&self) -> Result<(), BackendError> {
        let response = self
            .authorized(self.client.post(self.url("/v1/unload")))
            .timeout(Duration::from_secs(self.config.unload_timeout_secs))
            .send()
            .await?;
        Self::expect_ok("/v1/unload", response).await?;
        Ok(())
    }

    async fn submit(&self, task: &SubmitTask) -> Result<TaskId, BackendError> {
        let audio = tokio::fs::read(&task.audio_path).await?;
        let audio_part = multipart::Part::bytes(audio)
            .file_name(task.audio_file_name())
            .mime_str("audio/wav")?;

        let form = task
            .form_fields()
            .into_iter()
            .fold(multipart::Form::new(), |form, (name, value)| {
                form.text(name, value)
            })
            .part("ctx_audio", audio_part);

        debug!(track = %task.track, bpm = task.bpm, "Submitting lego task");

        let response = self
            .authorized(self.client.post(self.url("/release_task")))
            .multipart(form)
            .timeout(Duration::from_secs(self.config.submit_timeout_secs))
            .send()
            .await?;
        let response = Self::expect_ok("/release_task", response).await?;

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| BackendError::parse(format!("release_task response: {}", e)))?;

        match body.data.task_id {
            Value::String(id) if !id.is_empty() => Ok(TaskId::new(id)),
            Value::Number(n) => Ok(TaskId::new(n.to_string())),
            other => Err(BackendError::parse(format!(
                "release_task returned no usable task_id: {}",
                other
            ))),
        }
    }

    async fn query_status(&self, task_id: &TaskId) -> Result<TaskStatus, BackendError> {
        let response = self
            .authorized(self.client.post(self.url("/query_result")))
            .json(&json!({ "task_id_list": [task_id.as_str()] }))
            .timeout(Duration::from_secs(self.config.query_timeout_secs))
            .send()
            .await?;
        let response = Self::expect_ok("/query_result", response).await?;

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| BackendError::parse(format!("query_result response: {}", e)))?;

        let item = body
            .data
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::parse(format!("no status reported for {}", task_id)))?;

        Ok(TaskStatus::from_code(item.status, item.result, item.error))
    }

    async fn fetch_file(&self, path: &str) -> Result<Vec<u8>, BackendError> {
        let response = self
            .authorized(self.client.get(self.url(path)))
            .timeout(Duration::from_secs(self.config.fetch_timeout_secs))
            .send()
            .await?;
        let response = Self::expect_ok(path, response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn is_healthy(&self) -> bool {
        let result = self
            .authorized(self.client.get(self.url("/health")))
            .timeout(Duration::from_secs(self.config.health_timeout_secs))
            .send()
            .await;

        match result {
            Ok(response) => response.status().as_u16() == 200,
            Err(e) => {
                debug!("ACE-Step health probe failed: {}", e);
                false
            }
        }
    }
}
