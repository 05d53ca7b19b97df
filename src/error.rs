use crate::capture::RecordingState;

/// Errors raised by the encounter-capture pipeline.
///
/// Everything here is handled at the boundary where it occurs and converted
/// into a user-facing notice; none of these terminate a session. Transcription
/// failures for individual chunks are logged and dropped by the dispatcher
/// without interrupting the recording.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The clinician declined device access. Fatal to starting a session.
    #[error("device access was denied")]
    PermissionDenied,

    /// No compatible capture device or codec exists. Fatal to starting.
    #[error("no compatible capture device: {0}")]
    DeviceUnavailable(String),

    /// A recording control was invoked in a state that does not allow it.
    #[error("invalid recording transition: {action} while {from}")]
    InvalidTransition {
        from: RecordingState,
        action: &'static str,
    },

    /// A single chunk failed to transcribe. Recoverable and silent: the
    /// dispatcher logs it and drops the chunk's transcript contribution.
    #[error("transcription failed for chunk {sequence}: {detail}")]
    TranscriptionChunkFailed { sequence: u64, detail: String },

    /// Analysis was requested with an empty transcript. No network call is
    /// made; the clinician is prompted to provide content.
    #[error("nothing to analyze: transcript is empty")]
    NoContent,

    /// The analysis service call failed. The clinician may retry; existing
    /// suggestions are left untouched.
    #[error("analysis failed: {0}")]
    AnalysisFailed(String),

    /// Uploading the assembled recording failed. Reported, but never rolls
    /// back the transcript or suggestions.
    #[error("recording upload failed: {0}")]
    PersistenceFailed(String),

    /// A suggestion operation referenced an index that does not exist.
    #[error("no {kind} suggestion at index {index}")]
    SuggestionOutOfRange { kind: &'static str, index: usize },

    /// The directory has no such appointment.
    #[error("appointment {0} not found")]
    AppointmentNotFound(i64),

    /// No active encounter session for this appointment.
    #[error("no active session for appointment {0}")]
    SessionNotFound(i64),

    /// The appointment already has a session that is still recording.
    #[error("appointment {0} already has an active recording")]
    SessionAlreadyActive(i64),

    /// A collaborator answered with a non-success HTTP status.
    #[error("{service} service returned status {status}")]
    ServiceStatus { service: &'static str, status: u16 },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed service payload: {0}")]
    Payload(#[from] serde_json::Error),
}
