use crate::capture::{CaptureSource, MediaConstraints};
use std::time::Duration;

/// Configuration for one encounter-capture session
#[derive(Debug, Clone)]
pub struct EncounterConfig {
    /// Appointment this encounter belongs to
    pub appointment_id: i64,

    /// Requested capture parameters (audio-only or audio+video)
    pub constraints: MediaConstraints,

    /// Where capture input comes from
    pub source: CaptureSource,

    /// Duration of each transcription chunk
    /// Default: 4 seconds
    pub chunk_duration: Duration,

    /// Recognition language tag (e.g. "en-US")
    pub language: String,

    /// Speaker label applied to transcript segments, when known
    pub speaker_label: Option<String>,
}

impl EncounterConfig {
    pub fn new(appointment_id: i64, source: CaptureSource) -> Self {
        Self {
            appointment_id,
            constraints: MediaConstraints::default(),
            source,
            chunk_duration: Duration::from_secs(4),
            language: "en-US".to_string(),
            speaker_label: None,
        }
    }
}
