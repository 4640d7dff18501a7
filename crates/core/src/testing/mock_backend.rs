//! Mock ACE-Step backend for testing.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::backend::{BackendClient, BackendError, SubmitTask, TaskId, TaskStatus};

/// Result list the mock reports for a finished task by default.
pub const DEFAULT_RESULT: &str = r#"[{"file": "/v1/audio?path=out.mp3"}]"#;

/// Audio bytes the mock serves for any fetched file by default.
pub const DEFAULT_AUDIO: &[u8] = b"ID3\x04fake-mp3";

/// One backend call, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Load,
    Unload,
    Submit,
    Query(String),
    Fetch(String),
}

/// A recorded submission for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSubmit {
    pub task: SubmitTask,
    /// Whether the context audio file existed at submit time.
    pub audio_existed: bool,
}

/// Mock implementation of the BackendClient trait.
///
/// Answers every call successfully by default: one query reports the task
/// done with [`DEFAULT_RESULT`], and fetches return [`DEFAULT_AUDIO`].
/// Status replies can be scripted with [`MockBackend::set_statuses`]; the
/// last scripted status repeats once the script runs out.
#[derive(Debug)]
pub struct MockBackend {
    calls: Arc<RwLock<Vec<BackendCall>>>,
    submits: Arc<RwLock<Vec<RecordedSubmit>>>,
    statuses: Arc<RwLock<VecDeque<TaskStatus>>>,
    task_id: Arc<RwLock<String>>,
    audio: Arc<RwLock<Vec<u8>>>,
    load_fails: Arc<RwLock<bool>>,
    unload_fails: Arc<RwLock<bool>>,
    unload_delay: Arc<RwLock<Option<Duration>>>,
    submit_fails: Arc<RwLock<bool>>,
    query_fails: Arc<RwLock<bool>>,
    fetch_fails: Arc<RwLock<bool>>,
    panic_on_submit: Arc<RwLock<bool>>,
    healthy: Arc<RwLock<bool>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a backend that completes every task on the first query.
    pub fn new() -> Self {
        let done = TaskStatus::Succeeded {
            result: Value::String(DEFAULT_RESULT.to_string()),
        };
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            submits: Arc::new(RwLock::new(Vec::new())),
            statuses: Arc::new(RwLock::new(VecDeque::from([done]))),
            task_id: Arc::new(RwLock::new("t1".to_string())),
            audio: Arc::new(RwLock::new(DEFAULT_AUDIO.to_vec())),
            load_fails: Arc::new(RwLock::new(false)),
            unload_fails: Arc::new(RwLock::new(false)),
            unload_delay: Arc::new(RwLock::new(None)),
            submit_fails: Arc::new(RwLock::new(false)),
            query_fails: Arc::new(RwLock::new(false)),
            fetch_fails: Arc::new(RwLock::new(false)),
            panic_on_submit: Arc::new(RwLock::new(false)),
            healthy: Arc::new(RwLock::new(true)),
        }
    }

    /// Script the replies to successive status queries.
    pub async fn set_statuses(&self, statuses: Vec<TaskStatus>) {
        *self.statuses.write().await = statuses.into();
    }

    /// Set the task id handed out on submit.
    pub async fn set_task_id(&self, id: impl Into<String>) {
        *self.task_id.write().await = id.into();
    }

    /// Set the bytes served for fetched files.
    pub async fn set_audio(&self, audio: impl Into<Vec<u8>>) {
        *self.audio.write().await = audio.into();
    }

    pub async fn set_load_fails(&self, fails: bool) {
        *self.load_fails.write().await = fails;
    }

    pub async fn set_unload_fails(&self, fails: bool) {
        *self.unload_fails.write().await = fails;
    }

    /// Make `unload_model` take `delay` before answering.
    pub async fn set_unload_delay(&self, delay: Duration) {
        *self.unload_delay.write().await = Some(delay);
    }

    pub async fn set_submit_fails(&self, fails: bool) {
        *self.submit_fails.write().await = fails;
    }

    pub async fn set_query_fails(&self, fails: bool) {
        *self.query_fails.write().await = fails;
    }

    pub async fn set_fetch_fails(&self, fails: bool) {
        *self.fetch_fails.write().await = fails;
    }

    /// Panic inside `submit`, after recording it.
    pub async fn set_panic_on_submit(&self, panic: bool) {
        *self.panic_on_submit.write().await = panic;
    }

    pub async fn set_healthy(&self, healthy: bool) {
        *self.healthy.write().await = healthy;
    }

    /// All calls so far, in order.
    pub async fn calls(&self) -> Vec<BackendCall> {
        self.calls.read().await.clone()
    }

    /// All submissions so far.
    pub async fn submitted(&self) -> Vec<RecordedSubmit> {
        self.submits.read().await.clone()
    }

    pub async fn load_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Load)).await
    }

    pub async fn unload_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Unload)).await
    }

    pub async fn query_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Query(_))).await
    }

    /// Paths passed to `fetch_file`.
    pub async fn fetched(&self) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                BackendCall::Fetch(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    async fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.read().await.iter().filter(|c| pred(c)).count()
    }

    async fn record(&self, call: BackendCall) {
        self.calls.write().await.push(call);
    }
}

fn failure(endpoint: &str) -> BackendError {
    BackendError::Status {
        endpoint: endpoint.to_string(),
        status: 500,
        body: "mock failure".to_string(),
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    async fn load_model(&self) -> Result<(), BackendError> {
        self.record(BackendCall::Load).await;
        if *self.load_fails.read().await {
            return Err(failure("/v1/load"));
        }
        Ok(())
    }

    async fn unload_model(&self) -> Result<(), BackendError> {
        self.record(BackendCall::Unload).await;
        let delay = *self.unload_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.unload_fails.read().await {
            return Err(failure("/v1/unload"));
        }
        Ok(())
    }

    async fn submit(&self, task: &SubmitTask) -> Result<TaskId, BackendError> {
        self.record(BackendCall::Submit).await;
        let audio_existed = tokio::fs::metadata(&task.audio_path).await.is_ok();
        self.submits.write().await.push(RecordedSubmit {
            task: task.clone(),
            audio_existed,
        });

        if *self.panic_on_submit.read().await {
            panic!("mock backend panicked on submit");
        }
        if *self.submit_fails.read().await {
            return Err(failure("/release_task"));
        }
        Ok(TaskId::new(self.task_id.read().await.clone()))
    }

    async fn query_status(&self, task_id: &TaskId) -> Result<TaskStatus, BackendError> {
        self.record(BackendCall::Query(task_id.to_string())).await;
        if *self.query_fails.read().await {
            return Err(failure("/query_result"));
        }

        let mut statuses = self.statuses.write().await;
        let status = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        Ok(status.unwrap_or(TaskStatus::Pending))
    }

    async fn fetch_file(&self, path: &str) -> Result<Vec<u8>, BackendError> {
        self.record(BackendCall::Fetch(path.to_string())).await;
        if *self.fetch_fails.read().await {
            return Err(failure(path));
        }
        Ok(self.audio.read().await.clone())
    }

    async fn is_healthy(&self) -> bool {
        *self.healthy.read().await
    }
}
