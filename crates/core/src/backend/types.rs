use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

use crate::job::TrackCategory;

use super::BackendError;

/// Opaque task identifier handed out by `/release_task`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of a submitted task, as reported by `/query_result`.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskStatus {
    Pending,
    /// `result` lists the generated files (see [`first_output_file`]).
    Succeeded { result: Value },
    Failed { error: Option<String> },
}

impl TaskStatus {
    /// Map a backend status code. Unknown codes are treated as still running.
    pub fn from_code(code: i64, result: Option<Value>, error: Option<String>) -> Self {
        match code {
            1 => TaskStatus::Succeeded {
                result: result.unwrap_or(Value::Null),
            },
            2 => TaskStatus::Failed { error },
            _ => TaskStatus::Pending,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OutputFile {
    file: String,
}

/// Path of the first generated file in a task result.
///
/// The backend reports `result` as a JSON-encoded string holding a list of
/// `{"file": "..."}` objects; an already-decoded list is accepted too.
pub fn first_output_file(result: &Value) -> Result<String, BackendError> {
    let files: Vec<OutputFile> = match result {
        Value::String(encoded) => serde_json::from_str(encoded)
            .map_err(|e| BackendError::parse(format!("invalid result list: {}", e)))?,
        Value::Array(_) => serde_json::from_value(result.clone())
            .map_err(|e| BackendError::parse(format!("invalid result list: {}", e)))?,
        other => {
            return Err(BackendError::parse(format!(
                "expected a result list, got {}",
                other
            )))
        }
    };

    files
        .into_iter()
        .next()
        .map(|f| f.file)
        .ok_or_else(|| BackendError::parse("result list is empty"))
}

/// Parameters of one lego submission.
#[derive(Debug, Clone)]
pub struct SubmitTask {
    /// Local copy of the context audio, uploaded as `ctx_audio`.
    pub audio_path: PathBuf,
    pub track: TrackCategory,
    pub caption: String,
    pub bpm: u32,
    pub time_signature: String,
    pub inference_steps: u32,
    pub batch_size: u32,
    /// Length of the context audio in seconds.
    pub audio_duration: f64,
    pub key_scale: Option<String>,
}

impl SubmitTask {
    /// Text fields of the multipart form, in submission order.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("task_type", "lego".to_string()),
            ("track_name", self.track.as_str().to_string()),
            ("caption", self.caption.clone()),
            ("bpm", self.bpm.to_string()),
            ("time_signature", self.time_signature.clone()),
            ("inference_steps", self.inference_steps.to_string()),
            ("thinking", "false".to_string()),
            ("use_cot_caption", "false".to_string()),
            // Whole-clip generation: no repaint window.
            ("repainting_start", "0.0".to_string()),
            ("repainting_end", "-1".to_string()),
            ("batch_size", self.batch_size.to_string()),
            ("audio_duration", self.audio_duration.to_string()),
        ];
        if let Some(key_scale) = &self.key_scale {
            fields.push(("key_scale", key_scale.clone()));
        }
        fields
    }

    /// File name used for the uploaded audio part.
    pub fn audio_file_name(&self) -> String {
        self.audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string()
    }
}
