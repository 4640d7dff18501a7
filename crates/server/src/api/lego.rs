//! Lego generation endpoint.

use axum::{
    extract::{multipart::Field, Multipart, State},
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error};

use lego_core::{GeneratedAudio, JobRequest};

use super::error::ApiError;
use crate::state::AppState;

/// Generate a stem for the uploaded audio.
///
/// Multipart fields: `audio_file` (file), `track_type`, `bpm`, and optionally
/// `key_scale`, `batch_size` and `caption`. Responds with the generated MP3.
pub async fn create_lego(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let request = parse_form(multipart, state.default_batch_size()).await?;
    debug!(
        track_type = %request.track_type,
        bpm = request.bpm,
        bytes = request.audio.len(),
        "Lego request received"
    );

    // Run detached so a client disconnect cannot cut the workflow short
    let orchestrator = state.orchestrator();
    let audio = tokio::spawn(async move { orchestrator.run(request).await })
        .await
        .map_err(|e| {
            error!(error = %e, "Lego job aborted");
            ApiError::internal("lego job aborted unexpectedly")
        })??;

    Ok(audio_response(audio))
}

fn audio_response(audio: GeneratedAudio) -> Response {
    (
        [
            (header::CONTENT_TYPE, audio.content_type().to_string()),
            (header::CONTENT_DISPOSITION, audio.content_disposition()),
        ],
        audio.data,
    )
        .into_response()
}

/// Collect the multipart form into a job request.
async fn parse_form(
    mut multipart: Multipart,
    default_batch_size: u32,
) -> Result<JobRequest, ApiError> {
    let mut audio: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut track_type: Option<String> = None;
    let mut bpm: Option<u32> = None;
    let mut key_scale: Option<String> = None;
    let mut batch_size: Option<u32> = None;
    let mut caption: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(ApiError::new(
                    e.status(),
                    format!("Malformed multipart body: {}", e.body_text()),
                ))
            }
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "audio_file" => {
                file_name = field.file_name().map(|s| s.to_string());
                let data = field.bytes().await.map_err(|e| {
                    ApiError::new(
                        e.status(),
                        format!("Failed to read audio_file: {}", e.body_text()),
                    )
                })?;
                audio = Some(data.to_vec());
            }
            "track_type" => track_type = Some(text(field, "track_type").await?),
            "bpm" => bpm = Some(number(field, "bpm").await?),
            "key_scale" => key_scale = Some(text(field, "key_scale").await?),
            "batch_size" => {
                let value = text(field, "batch_size").await?;
                if !value.trim().is_empty() {
                    batch_size = Some(parse_number("batch_size", &value)?);
                }
            }
            "caption" => caption = Some(text(field, "caption").await?),
            _ => {}
        }
    }

    let audio =
        audio.ok_or_else(|| ApiError::bad_request("Missing required field: audio_file"))?;
    if audio.is_empty() {
        return Err(ApiError::bad_request("audio_file is empty"));
    }

    Ok(JobRequest {
        audio,
        file_name,
        track_type: track_type
            .ok_or_else(|| ApiError::bad_request("Missing required field: track_type"))?,
        bpm: bpm.ok_or_else(|| ApiError::bad_request("Missing required field: bpm"))?,
        key_scale,
        batch_size: batch_size.unwrap_or(default_batch_size),
        caption,
    })
}

async fn text(field: Field<'_>, name: &str) -> Result<String, ApiError> {
    field.text().await.map_err(|e| {
        ApiError::new(
            e.status(),
            format!("Failed to read {}: {}", name, e.body_text()),
        )
    })
}

async fn number(field: Field<'_>, name: &str) -> Result<u32, ApiError> {
    let value = text(field, name).await?;
    parse_number(name, &value)
}

fn parse_number(name: &str, value: &str) -> Result<u32, ApiError> {
    value.trim().parse().map_err(|_| {
        ApiError::bad_request(format!(
            "{} must be a non-negative integer, got '{}'",
            name, value
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("bpm", " 120 ").unwrap(), 120);

        let err = parse_number("bpm", "fast").unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert!(err.message.contains("bpm"));
        assert!(err.message.contains("fast"));

        assert!(parse_number("batch_size", "-1").is_err());
    }
}
