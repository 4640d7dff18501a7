//! Job orchestrator implementation.

use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tempfile::{Builder, TempPath};
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::backend::{
    first_output_file, BackendClient, BackendError, SubmitTask, TaskId, TaskStatus,
};
use crate::job::{GeneratedAudio, JobRequest, TrackCategory};
use crate::metrics::{COMPENSATION_FAILURES, JOBS_TOTAL, JOB_DURATION, POLL_ITERATIONS};
use crate::probe::DurationProbe;
use crate::queue::QueueClient;

use super::config::OrchestratorConfig;
use super::lease::GpuLease;
use super::types::JobError;

/// Runs lego jobs against the queue service and the ACE-Step backend.
///
/// Holds no per-job state, so any number of `run` calls may proceed
/// concurrently. Admission control is left to the queue service.
pub struct JobOrchestrator {
    config: OrchestratorConfig,
    queue: Arc<dyn QueueClient>,
    backend: Arc<dyn BackendClient>,
    probe: Arc<dyn DurationProbe>,
}

impl JobOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        queue: Arc<dyn QueueClient>,
        backend: Arc<dyn BackendClient>,
        probe: Arc<dyn DurationProbe>,
    ) -> Self {
        Self {
            config,
            queue,
            backend,
            probe,
        }
    }

    /// Run one job to completion.
    ///
    /// Once GPU tokens are held, the model is unloaded and the tokens are
    /// released before this returns, whatever the outcome. The temporary copy
    /// of the upload is removed last. A panic inside the job is counted as an
    /// `internal` outcome and then resumed.
    pub async fn run(&self, request: JobRequest) -> Result<GeneratedAudio, JobError> {
        let start = Instant::now();
        let result = AssertUnwindSafe(self.execute(request)).catch_unwind().await;

        let outcome = match &result {
            Ok(Ok(_)) => "success",
            Ok(Err(e)) => e.outcome(),
            Err(_) => "internal",
        };
        JOBS_TOTAL.with_label_values(&[outcome]).inc();
        JOB_DURATION
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());

        match result {
            Ok(Ok(audio)) => {
                info!(
                    track = %audio.category,
                    bytes = audio.data.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Lego job completed"
                );
                Ok(audio)
            }
            Ok(Err(e)) => {
                warn!(outcome, error = %e, "Lego job failed");
                Err(e)
            }
            Err(panic) => {
                error!(outcome, "Lego job panicked");
                std::panic::resume_unwind(panic)
            }
        }
    }

    async fn execute(&self, request: JobRequest) -> Result<GeneratedAudio, JobError> {
        let category = validate(&request)?;

        let input = self.materialize(&request).await?;
        let result = self.process(&request, category, &input).await;

        if let Err(e) = input.close() {
            warn!(action = "temp_file", error = %e, "Failed to remove temporary input");
            COMPENSATION_FAILURES.with_label_values(&["temp_file"]).inc();
        }

        result.map(|data| GeneratedAudio { category, data })
    }

    /// Copy the upload into a temp file that is removed when dropped.
    async fn materialize(&self, request: &JobRequest) -> Result<TempPath, JobError> {
        let path = Builder::new()
            .prefix("lego-")
            .suffix(&request.file_suffix())
            .tempfile_in(&self.config.temp_dir)
            .map_err(|e| JobError::Internal(format!("failed to create temp file: {}", e)))?
            .into_temp_path();

        tokio::fs::write(&path, &request.audio)
            .await
            .map_err(|e| JobError::Internal(format!("failed to write temp file: {}", e)))?;

        debug!(path = %path.display(), bytes = request.audio.len(), "Upload materialized");
        Ok(path)
    }

    async fn process(
        &self,
        request: &JobRequest,
        category: TrackCategory,
        audio_path: &Path,
    ) -> Result<Vec<u8>, JobError> {
        let audio_duration = self.probe.duration_secs(audio_path).await.map_err(|e| {
            JobError::ClientError(format!("Could not determine audio duration: {}", e))
        })?;

        let lease = GpuLease::acquire(
            Arc::clone(&self.queue),
            Arc::clone(&self.backend),
            self.config.tokens,
        )
        .await
        .map_err(|e| JobError::ResourceUnavailable(e.to_string()))?;

        let task = SubmitTask {
            audio_path: audio_path.to_path_buf(),
            track: category,
            caption: request.effective_caption(category),
            bpm: request.bpm,
            time_signature: self.config.generation.time_signature.clone(),
            inference_steps: self.config.generation.inference_steps,
            batch_size: request.batch_size,
            audio_duration,
            key_scale: request.key_scale().map(str::to_string),
        };

        info!(
            session_id = %lease.session(),
            track = %category,
            bpm = request.bpm,
            audio_duration,
            "Starting generation"
        );

        let outcome = AssertUnwindSafe(self.generate(&task)).catch_unwind().await;

        lease.release().await;

        match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// Load, submit, poll and fetch. Compensation is the caller's job.
    async fn generate(&self, task: &SubmitTask) -> Result<Vec<u8>, JobError> {
        self.backend.load_model().await.map_err(upstream)?;

        let task_id = self.backend.submit(task).await.map_err(upstream)?;
        info!(task_id = %task_id, "Lego task submitted");

        let result = self.poll_until_done(&task_id).await?;

        let file = first_output_file(&result).map_err(upstream)?;
        debug!(task_id = %task_id, file = %file, "Downloading generated audio");

        self.backend.fetch_file(&file).await.map_err(|e| {
            JobError::UpstreamFailure(format!("Failed to download generated audio: {}", e))
        })
    }

    async fn poll_until_done(&self, task_id: &TaskId) -> Result<Value, JobError> {
        let interval = self.config.generation.poll_interval();
        let deadline = Instant::now() + self.config.generation.timeout();
        let mut polls: u32 = 0;

        let result = loop {
            if Instant::now() >= deadline {
                break Err(JobError::Timeout {
                    timeout_secs: self.config.generation.timeout_secs,
                });
            }

            polls += 1;
            let status = match self.backend.query_status(task_id).await {
                Ok(status) => status,
                Err(e) => break Err(upstream(e)),
            };

            match status {
                TaskStatus::Succeeded { result } => break Ok(result),
                TaskStatus::Failed { error } => {
                    break Err(JobError::UpstreamFailure(format!(
                        "ACE-Step generation failed: {}",
                        error.as_deref().unwrap_or("unknown error")
                    )))
                }
                TaskStatus::Pending => {
                    debug!(task_id = %task_id, polls, "Generation still running");
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            sleep(interval.min(remaining)).await;
        };

        POLL_ITERATIONS
            .with_label_values(&[])
            .observe(f64::from(polls));
        result
    }
}

fn validate(request: &JobRequest) -> Result<TrackCategory, JobError> {
    let category = request
        .track_type
        .parse::<TrackCategory>()
        .map_err(|e| JobError::ClientError(e.to_string()))?;

    if request.bpm == 0 {
        return Err(JobError::ClientError("bpm must be a positive integer".to_string()));
    }
    if request.batch_size == 0 {
        return Err(JobError::ClientError("batch_size must be at least 1".to_string()));
    }

    Ok(category)
}

fn upstream(e: BackendError) -> JobError {
    JobError::UpstreamFailure(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(track_type: &str) -> JobRequest {
        JobRequest {
            audio: b"RIFF".to_vec(),
            file_name: None,
            track_type: track_type.to_string(),
            bpm: 120,
            key_scale: None,
            batch_size: 1,
            caption: None,
        }
    }

    #[test]
    fn test_validate_accepts_known_category() {
        assert_eq!(validate(&request("drums")).unwrap(), TrackCategory::Drums);
    }

    #[test]
    fn test_validate_rejects_unknown_category() {
        let err = validate(&request("kazoo")).unwrap_err();
        assert!(matches!(err, JobError::ClientError(_)));
        assert!(err.to_string().contains("kazoo"));
    }

    #[test]
    fn test_validate_rejects_zero_bpm_and_batch() {
        let mut req = request("vocals");
        req.bpm = 0;
        assert!(matches!(validate(&req), Err(JobError::ClientError(_))));

        let mut req = request("vocals");
        req.batch_size = 0;
        assert!(matches!(validate(&req), Err(JobError::ClientError(_))));
    }
}
