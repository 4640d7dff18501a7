//! Testing utilities and mock implementations.
//!
//! Mocks for the queue service, the ACE-Step backend and the duration probe,
//! so the whole job lifecycle can be exercised without a GPU host.
//!
//! # Example
//!
//! ```rust,ignore
//! use lego_core::testing::{MockBackend, MockDurationProbe, MockQueueClient};
//!
//! let queue = MockQueueClient::new();
//! let backend = MockBackend::new();
//! let probe = MockDurationProbe::new();
//!
//! // Configure mock responses
//! backend.set_statuses(vec![TaskStatus::Pending, TaskStatus::Failed { error: None }]).await;
//! queue.set_release_fails(true).await;
//!
//! // Use in JobOrchestrator::new...
//! ```

mod mock_backend;
mod mock_probe;
mod mock_queue;

pub use mock_backend::{BackendCall, MockBackend, RecordedSubmit, DEFAULT_AUDIO, DEFAULT_RESULT};
pub use mock_probe::{MockDurationProbe, RecordedProbe};
pub use mock_queue::MockQueueClient;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::job::JobRequest;

    /// A minimal RIFF/WAVE header followed by a few silent samples.
    pub fn wav_bytes() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"RIFF");
        data.extend_from_slice(&44u32.to_le_bytes());
        data.extend_from_slice(b"WAVEfmt ");
        data.extend_from_slice(&16u32.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes()); // PCM
        data.extend_from_slice(&1u16.to_le_bytes()); // mono
        data.extend_from_slice(&44_100u32.to_le_bytes());
        data.extend_from_slice(&88_200u32.to_le_bytes());
        data.extend_from_slice(&2u16.to_le_bytes());
        data.extend_from_slice(&16u16.to_le_bytes());
        data.extend_from_slice(b"data");
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 8]);
        data
    }

    /// A request for `track_type` at 120 bpm with one variant and no overrides.
    pub fn job_request(track_type: &str) -> JobRequest {
        JobRequest {
            audio: wav_bytes(),
            file_name: Some("song.wav".to_string()),
            track_type: track_type.to_string(),
            bpm: 120,
            key_scale: None,
            batch_size: 1,
            caption: None,
        }
    }
}
