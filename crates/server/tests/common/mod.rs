//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock queue, backend and probe injected, so the whole `/lego` flow
//! can be exercised without a GPU host.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use lego_core::{
    testing::{MockBackend, MockDurationProbe, MockQueueClient},
    Config, JobOrchestrator, OrchestratorConfig,
};
use lego_server::state::AppState;

/// Re-export fixtures for test convenience
pub use lego_core::testing::fixtures;

const BOUNDARY: &str = "lego-test-boundary";

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_generation() {
///     let fixture = TestFixture::new();
///
///     let form = Form::new()
///         .file("audio_file", "song.wav", &fixtures::wav_bytes())
///         .text("track_type", "drums")
///         .text("bpm", "120");
///     let response = fixture.post_form("/lego", form).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock queue - refuse, fail releases, inspect sessions
    pub queue: Arc<MockQueueClient>,
    /// Mock backend - script statuses and failures, inspect calls
    pub backend: Arc<MockBackend>,
    /// Mock duration probe
    pub probe: Arc<MockDurationProbe>,
    /// Temporary directory used for uploads
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Bytes,
}

impl TestResponse {
    /// Body parsed as JSON (`Null` when it is not JSON).
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or(Value::Null)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Hand-built multipart/form-data body.
#[derive(Default)]
pub struct Form {
    body: Vec<u8>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n{}",
                BOUNDARY, name, file_name, "Content-Type: audio/wav\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a test fixture with custom configuration.
    pub fn with_config(mut config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        config.probe.temp_dir = temp_dir.path().to_path_buf();
        config.generation.poll_interval_ms = 10;
        config.backend.url = "http://acestep.test:8001".to_string();

        let queue = Arc::new(MockQueueClient::new());
        let backend = Arc::new(MockBackend::new());
        let probe = Arc::new(MockDurationProbe::new());

        let orchestrator = Arc::new(JobOrchestrator::new(
            OrchestratorConfig::from(&config),
            queue.clone(),
            backend.clone(),
            probe.clone(),
        ));

        let state = Arc::new(AppState::new(config, orchestrator, backend.clone()));
        let router = lego_server::api::create_router(state);

        Self {
            router,
            queue,
            backend,
            probe,
            temp_dir,
        }
    }

    /// Number of files left in the upload temp dir.
    pub fn temp_files_left(&self) -> usize {
        std::fs::read_dir(self.temp_dir.path())
            .expect("Failed to read temp dir")
            .count()
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a multipart POST request.
    pub async fn post_form(&self, path: &str, form: Form) -> TestResponse {
        self.post_raw(
            path,
            form.finish(),
            &format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .await
    }

    /// Send a POST request with a raw body and content type.
    pub async fn post_raw(&self, path: &str, body: Vec<u8>, content_type: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            headers,
            bytes,
        }
    }
}

/// The standard valid form for `track_type`, before optional fields.
pub fn lego_form(track_type: &str) -> Form {
    Form::new()
        .file("audio_file", "song.wav", &fixtures::wav_bytes())
        .text("track_type", track_type)
        .text("bpm", "120")
}
