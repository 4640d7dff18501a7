use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Stem type the backend is asked to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackCategory {
    Vocals,
    BackingVocals,
    Drums,
}

impl TrackCategory {
    /// All accepted categories, in the order they are reported to callers.
    pub const ALL: [TrackCategory; 3] = [
        TrackCategory::BackingVocals,
        TrackCategory::Drums,
        TrackCategory::Vocals,
    ];

    /// Wire name, as sent by clients and forwarded to the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackCategory::Vocals => "vocals",
            TrackCategory::BackingVocals => "backing_vocals",
            TrackCategory::Drums => "drums",
        }
    }

    /// Caption used when the caller does not supply one.
    pub fn default_caption(&self) -> &'static str {
        match self {
            TrackCategory::Vocals => {
                "soulful indie vocalist, warm, wordless melody, expressive, intimate"
            }
            TrackCategory::BackingVocals => {
                "background vocals, close harmony, wordless, warm, following the lead vocal"
            }
            TrackCategory::Drums => {
                "live acoustic drum kit, tight kick and snare, brushed hi-hats, warm"
            }
        }
    }

    /// File name given to the generated stem in the response.
    pub fn attachment_name(&self) -> String {
        format!("{}.mp3", self.as_str())
    }
}

impl fmt::Display for TrackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("track_type must be one of [{allowed}], got '{0}'", allowed = allowed_categories())]
pub struct UnknownTrackCategory(pub String);

fn allowed_categories() -> String {
    TrackCategory::ALL
        .iter()
        .map(|c| format!("'{}'", c.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

impl FromStr for TrackCategory {
    type Err = UnknownTrackCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrackCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownTrackCategory(s.to_string()))
    }
}

/// A lego generation request as received from a client.
///
/// `track_type` is kept as the raw string so validation happens inside the
/// workflow, before anything is touched.
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// Uploaded context audio.
    pub audio: Vec<u8>,
    /// File name of the upload, used to pick the temp file suffix.
    pub file_name: Option<String>,
    pub track_type: String,
    /// Tempo of the context audio in beats per minute.
    pub bpm: u32,
    /// Optional key/scale, e.g. "F# minor".
    pub key_scale: Option<String>,
    pub batch_size: u32,
    /// Caption override; blank means "use the category preset".
    pub caption: Option<String>,
}

impl JobRequest {
    /// Caption to submit for `category`: the caller's override, verbatim, when
    /// it has any non-whitespace content; the category preset otherwise.
    pub fn effective_caption(&self, category: TrackCategory) -> String {
        match self.caption.as_deref() {
            Some(caption) if !caption.trim().is_empty() => caption.to_string(),
            _ => category.default_caption().to_string(),
        }
    }

    /// Key/scale with blanks normalised away.
    pub fn key_scale(&self) -> Option<&str> {
        self.key_scale
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Suffix for the temporary input copy, including the leading dot.
    pub fn file_suffix(&self) -> String {
        self.file_name
            .as_deref()
            .and_then(|name| std::path::Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_else(|| ".wav".to_string())
    }
}

/// Audio produced by a successful workflow.
#[derive(Debug, Clone)]
pub struct GeneratedAudio {
    pub category: TrackCategory,
    pub data: Vec<u8>,
}

impl GeneratedAudio {
    pub fn content_type(&self) -> &'static str {
        "audio/mpeg"
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.category.attachment_name())
    }
}
