//! Inbound job description and per-request identifiers.
//!
//! A [`JobRequest`] is what the caller hands the wrapper: an audio asset plus
//! the lego parameters. The orchestrator validates it into a [`TrackCategory`]
//! and correlates the GPU token lease with a fresh [`SessionId`].

mod session;
mod types;

pub use session::SessionId;
pub use types::{GeneratedAudio, JobRequest, TrackCategory, UnknownTrackCategory};
