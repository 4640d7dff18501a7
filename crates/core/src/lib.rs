pub mod backend;
pub mod config;
pub mod job;
pub mod metrics;
pub mod orchestrator;
pub mod probe;
pub mod queue;
pub mod testing;

pub use backend::{BackendClient, BackendError, HttpBackend, SubmitTask, TaskId, TaskStatus};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use job::{GeneratedAudio, JobRequest, SessionId, TrackCategory};
pub use orchestrator::{JobError, JobOrchestrator, OrchestratorConfig};
pub use probe::{DurationProbe, FfprobeProbe, ProbeError};
pub use queue::{HttpQueueClient, QueueClient, QueueError};
