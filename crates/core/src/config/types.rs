use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted upload body in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8002
}

fn default_max_upload_bytes() -> usize {
    64 * 1024 * 1024
}

/// ACE-Step backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Base URL of the ACE-Step api server (e.g., "http://localhost:8001")
    #[serde(default = "default_backend_url")]
    pub url: String,
    /// Optional API key, sent as a bearer token on every backend call
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model load timeout in seconds (first load reads weights from disk)
    #[serde(default = "default_load_timeout")]
    pub load_timeout_secs: u64,
    #[serde(default = "default_unload_timeout")]
    pub unload_timeout_secs: u64,
    #[serde(default = "default_submit_timeout")]
    pub submit_timeout_secs: u64,
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
}

impl BackendConfig {
    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// API key, if one is configured and non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            api_key: None,
            load_timeout_secs: default_load_timeout(),
            unload_timeout_secs: default_unload_timeout(),
            submit_timeout_secs: default_submit_timeout(),
            query_timeout_secs: default_query_timeout(),
            fetch_timeout_secs: default_fetch_timeout(),
            health_timeout_secs: default_health_timeout(),
        }
    }
}

fn default_backend_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_load_timeout() -> u64 {
    120
}

fn default_unload_timeout() -> u64 {
    30
}

fn default_submit_timeout() -> u64 {
    60
}

fn default_query_timeout() -> u64 {
    15
}

fn default_fetch_timeout() -> u64 {
    60
}

fn default_health_timeout() -> u64 {
    5
}

/// GPU queue service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Base URL of the gpu-queue-service
    #[serde(default = "default_queue_url")]
    pub url: String,
    /// GPU tokens claimed per job
    #[serde(default = "default_tokens")]
    pub tokens: u32,
    /// Timeout for each queue call in seconds
    #[serde(default = "default_queue_timeout")]
    pub timeout_secs: u64,
}

impl QueueConfig {
    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            url: default_queue_url(),
            tokens: default_tokens(),
            timeout_secs: default_queue_timeout(),
        }
    }
}

fn default_queue_url() -> String {
    "http://gpu-queue-service:8085".to_string()
}

fn default_tokens() -> u32 {
    1000
}

fn default_queue_timeout() -> u64 {
    10
}

/// Generation parameters and polling behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    #[serde(default = "default_inference_steps")]
    pub inference_steps: u32,
    #[serde(default = "default_time_signature")]
    pub time_signature: String,
    /// Delay between status polls (milliseconds)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Wall-clock budget for a single generation (seconds)
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
    /// Batch size used when the caller does not send one
    #[serde(default = "default_batch_size")]
    pub default_batch_size: u32,
}

impl GenerationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            inference_steps: default_inference_steps(),
            time_signature: default_time_signature(),
            poll_interval_ms: default_poll_interval(),
            timeout_secs: default_generation_timeout(),
            default_batch_size: default_batch_size(),
        }
    }
}

fn default_inference_steps() -> u32 {
    50
}

fn default_time_signature() -> String {
    "4".to_string()
}

fn default_poll_interval() -> u64 {
    3000 // 3 seconds
}

fn default_generation_timeout() -> u64 {
    300 // 5 minutes
}

fn default_batch_size() -> u32 {
    1
}

/// Duration probing and scratch storage
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,
    /// Timeout for one ffprobe invocation in seconds.
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,
    /// Directory for temporary copies of uploaded audio.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_probe_timeout(),
            temp_dir: default_temp_dir(),
        }
    }
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir()
}

/// Sanitized config for logs and API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub backend: SanitizedBackendConfig,
    pub queue: QueueConfig,
    pub generation: GenerationConfig,
    pub probe: ProbeConfig,
}

/// Backend config with the API key hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedBackendConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub load_timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            backend: SanitizedBackendConfig {
                url: config.backend.url.clone(),
                api_key_configured: config.backend.api_key().is_some(),
                load_timeout_secs: config.backend.load_timeout_secs,
            },
            queue: config.queue.clone(),
            generation: config.generation.clone(),
            probe: config.probe.clone(),
        }
    }
}
