use super::state::AppState;
use crate::analysis::{ExamSuggestion, IcdSuggestion, ManualNotes, SuggestionKind};
use crate::capture::{CaptureKind, CaptureSource, MediaConstraints, RecordingState};
use crate::error::CaptureError;
use crate::evidence::ExamEvidenceItem;
use crate::session::{EncounterConfig, EncounterSession};
use crate::transcript::TranscriptSegment;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StartEncounterRequest {
    /// Capture from a WAV file instead of the platform device
    pub source_file: Option<PathBuf>,

    /// Request camera video in addition to audio
    #[serde(default)]
    pub video: bool,

    /// Chunk duration in seconds (default from configuration)
    pub chunk_duration_secs: Option<u64>,

    /// Recognition language tag (default from configuration)
    pub language: Option<String>,

    /// Speaker label applied to transcript segments
    pub speaker_label: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartEncounterResponse {
    pub appointment_id: i64,
    pub session_id: Uuid,
    pub patient_name: String,
    pub status: RecordingState,
}

#[derive(Debug, Serialize)]
pub struct ControlResponse {
    pub appointment_id: i64,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub segments: Vec<TranscriptSegment>,
    pub full_text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EvidenceQuery {
    pub query: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    /// Free-text patient context forwarded to the analysis service
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ManualAnalyzeRequest {
    #[serde(default)]
    pub anamnesis: String,
    #[serde(default)]
    pub physical_exam: String,
    #[serde(default)]
    pub conduct: String,
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub diagnoses: Vec<IcdSuggestion>,
    pub exams: Vec<ExamSuggestion>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Error mapping
// ============================================================================

fn error_status(error: &CaptureError) -> StatusCode {
    match error {
        CaptureError::PermissionDenied | CaptureError::DeviceUnavailable(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        CaptureError::InvalidTransition { .. } | CaptureError::SessionAlreadyActive(_) => {
            StatusCode::CONFLICT
        }
        CaptureError::NoContent => StatusCode::UNPROCESSABLE_ENTITY,
        CaptureError::AppointmentNotFound(_)
        | CaptureError::SessionNotFound(_)
        | CaptureError::SuggestionOutOfRange { .. } => StatusCode::NOT_FOUND,
        CaptureError::TranscriptionChunkFailed { .. }
        | CaptureError::AnalysisFailed(_)
        | CaptureError::PersistenceFailed(_)
        | CaptureError::ServiceStatus { .. }
        | CaptureError::Network(_)
        | CaptureError::Payload(_) => StatusCode::BAD_GATEWAY,
    }
}

fn error_response(error: CaptureError) -> Response {
    (
        error_status(&error),
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

async fn find_session(
    state: &AppState,
    appointment_id: i64,
) -> Result<Arc<EncounterSession>, CaptureError> {
    let sessions = state.sessions.read().await;
    sessions
        .get(&appointment_id)
        .cloned()
        .ok_or(CaptureError::SessionNotFound(appointment_id))
}

fn parse_kind(kind: &str) -> Option<SuggestionKind> {
    match kind {
        "diagnosis" => Some(SuggestionKind::Diagnosis),
        "exam" => Some(SuggestionKind::Exam),
        _ => None,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /encounters/:appointment_id/start
/// Create an encounter session and begin recording
pub async fn start_encounter(
    State(state): State<AppState>,
    Path(appointment_id): Path<i64>,
    body: Option<Json<StartEncounterRequest>>,
) -> impl IntoResponse {
    let Json(req) = body.unwrap_or_default();

    info!("Starting encounter recording for appointment {appointment_id}");

    // Reject early while a recording for this appointment is live
    {
        let sessions = state.sessions.read().await;
        if let Some(existing) = sessions.get(&appointment_id) {
            let current = existing.state().await;
            if matches!(
                current,
                RecordingState::Recording | RecordingState::Paused
            ) {
                return error_response(CaptureError::SessionAlreadyActive(appointment_id));
            }
        }
    }

    let defaults = &state.config.capture;
    let source = req
        .source_file
        .map(CaptureSource::File)
        .unwrap_or(CaptureSource::Device);
    let kind = if req.video {
        CaptureKind::AudioVideo
    } else {
        CaptureKind::Audio
    };

    let mut config = EncounterConfig::new(appointment_id, source);
    config.constraints = MediaConstraints {
        kind,
        sample_rate: defaults.sample_rate,
        channels: defaults.channels,
    };
    config.chunk_duration =
        Duration::from_secs(req.chunk_duration_secs.unwrap_or(defaults.chunk_secs));
    config.language = req.language.unwrap_or_else(|| defaults.language.clone());
    config.speaker_label = req.speaker_label;

    let session = match EncounterSession::create(config, state.clients.clone()).await {
        Ok(session) => Arc::new(session),
        Err(e) => {
            error!("Failed to create encounter session: {e}");
            return error_response(e);
        }
    };

    if let Err(e) = session.start().await {
        error!("Failed to start recording: {e}");
        return error_response(e);
    }

    let response = StartEncounterResponse {
        appointment_id,
        session_id: session.session_id(),
        patient_name: session.patient().patient_name.clone(),
        status: RecordingState::Recording,
    };

    // A finished session for the same appointment is replaced; tear it
    // down so anything it still holds is released.
    let previous = {
        let mut sessions = state.sessions.write().await;
        sessions.insert(appointment_id, Arc::clone(&session))
    };
    if let Some(previous) = previous {
        previous.teardown().await;
    }

    info!(
        appointment_id,
        session_id = %session.session_id(),
        "Recording started"
    );
    (StatusCode::OK, Json(response)).into_response()
}

/// POST /encounters/:appointment_id/pause
pub async fn pause_encounter(
    State(state): State<AppState>,
    Path(appointment_id): Path<i64>,
) -> impl IntoResponse {
    let session = match find_session(&state, appointment_id).await {
        Ok(session) => session,
        Err(e) => return error_response(e),
    };

    if let Err(e) = session.pause().await {
        return error_response(e);
    }

    (
        StatusCode::OK,
        Json(ControlResponse {
            appointment_id,
            status: session.state().await.to_string(),
            message: "Recording paused".to_string(),
        }),
    )
        .into_response()
}

/// POST /encounters/:appointment_id/resume
pub async fn resume_encounter(
    State(state): State<AppState>,
    Path(appointment_id): Path<i64>,
) -> impl IntoResponse {
    let session = match find_session(&state, appointment_id).await {
        Ok(session) => session,
        Err(e) => return error_response(e),
    };

    if let Err(e) = session.resume().await {
        return error_response(e);
    }

    (
        StatusCode::OK,
        Json(ControlResponse {
            appointment_id,
            status: session.state().await.to_string(),
            message: "Recording resumed".to_string(),
        }),
    )
        .into_response()
}

/// POST /encounters/:appointment_id/stop
/// Stop recording; archival upload continues in the background and late
/// transcription results keep merging
pub async fn stop_encounter(
    State(state): State<AppState>,
    Path(appointment_id): Path<i64>,
) -> impl IntoResponse {
    info!("Stopping encounter recording for appointment {appointment_id}");

    let session = match find_session(&state, appointment_id).await {
        Ok(session) => session,
        Err(e) => return error_response(e),
    };

    if let Err(e) = session.stop().await {
        error!("Failed to stop recording: {e}");
        return error_response(e);
    }

    (
        StatusCode::OK,
        Json(ControlResponse {
            appointment_id,
            status: RecordingState::Stopped.to_string(),
            message: "Recording stopped; archival upload running".to_string(),
        }),
    )
        .into_response()
}

/// GET /encounters/:appointment_id/status
pub async fn encounter_status(
    State(state): State<AppState>,
    Path(appointment_id): Path<i64>,
) -> impl IntoResponse {
    match find_session(&state, appointment_id).await {
        Ok(session) => (StatusCode::OK, Json(session.status().await)).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /encounters/:appointment_id/transcript
/// Transcript accumulated so far, in chunk sequence order
pub async fn encounter_transcript(
    State(state): State<AppState>,
    Path(appointment_id): Path<i64>,
) -> impl IntoResponse {
    let session = match find_session(&state, appointment_id).await {
        Ok(session) => session,
        Err(e) => return error_response(e),
    };

    let response = TranscriptResponse {
        segments: session.transcript_segments().await,
        full_text: session.transcript_text().await,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// GET /encounters/:appointment_id/evidence
/// The patient's exam evidence; `?query=` filters by name
pub async fn list_evidence(
    State(state): State<AppState>,
    Path(appointment_id): Path<i64>,
    Query(params): Query<EvidenceQuery>,
) -> impl IntoResponse {
    let session = match find_session(&state, appointment_id).await {
        Ok(session) => session,
        Err(e) => return error_response(e),
    };

    let items: Result<Vec<ExamEvidenceItem>, CaptureError> = match params.query {
        Some(query) => session.search_evidence(&query).await,
        None => session.evidence_items().await,
    };

    match items {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => {
            error!("Failed to load exam evidence: {e}");
            error_response(e)
        }
    }
}

/// POST /encounters/:appointment_id/evidence/:evidence_id/toggle
pub async fn toggle_evidence(
    State(state): State<AppState>,
    Path((appointment_id, evidence_id)): Path<(i64, i64)>,
) -> impl IntoResponse {
    let session = match find_session(&state, appointment_id).await {
        Ok(session) => session,
        Err(e) => return error_response(e),
    };

    match session.toggle_evidence(evidence_id).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /encounters/:appointment_id/analyze
/// Submit the recorded transcript plus selected evidence for analysis
pub async fn analyze_encounter(
    State(state): State<AppState>,
    Path(appointment_id): Path<i64>,
    body: Option<Json<AnalyzeRequest>>,
) -> impl IntoResponse {
    let Json(req) = body.unwrap_or_default();

    let session = match find_session(&state, appointment_id).await {
        Ok(session) => session,
        Err(e) => return error_response(e),
    };

    if let Err(e) = session.analyze_recorded(&req.context).await {
        error!("Analysis failed for appointment {appointment_id}: {e}");
        return error_response(e);
    }

    suggestions_response(&session).await
}

/// POST /encounters/:appointment_id/analyze/manual
/// Submit manually typed notes for analysis instead of a recording
pub async fn analyze_manual(
    State(state): State<AppState>,
    Path(appointment_id): Path<i64>,
    body: Option<Json<ManualAnalyzeRequest>>,
) -> impl IntoResponse {
    let Json(req) = body.unwrap_or_default();

    let session = match find_session(&state, appointment_id).await {
        Ok(session) => session,
        Err(e) => return error_response(e),
    };

    let notes = ManualNotes {
        anamnesis: req.anamnesis,
        physical_exam: req.physical_exam,
        conduct: req.conduct,
    };

    if let Err(e) = session.analyze_manual(&notes, &req.context).await {
        error!("Manual analysis failed for appointment {appointment_id}: {e}");
        return error_response(e);
    }

    suggestions_response(&session).await
}

/// GET /encounters/:appointment_id/suggestions
pub async fn list_suggestions(
    State(state): State<AppState>,
    Path(appointment_id): Path<i64>,
) -> impl IntoResponse {
    match find_session(&state, appointment_id).await {
        Ok(session) => suggestions_response(&session).await,
        Err(e) => error_response(e),
    }
}

/// POST /encounters/:appointment_id/suggestions/:kind/:index/approve
pub async fn approve_suggestion(
    State(state): State<AppState>,
    Path((appointment_id, kind, index)): Path<(i64, String, usize)>,
) -> impl IntoResponse {
    review_action(&state, appointment_id, &kind, index, ReviewAction::Approve).await
}

/// POST /encounters/:appointment_id/suggestions/:kind/:index/unapprove
pub async fn unapprove_suggestion(
    State(state): State<AppState>,
    Path((appointment_id, kind, index)): Path<(i64, String, usize)>,
) -> impl IntoResponse {
    review_action(&state, appointment_id, &kind, index, ReviewAction::Unapprove).await
}

/// DELETE /encounters/:appointment_id/suggestions/:kind/:index
pub async fn remove_suggestion(
    State(state): State<AppState>,
    Path((appointment_id, kind, index)): Path<(i64, String, usize)>,
) -> impl IntoResponse {
    review_action(&state, appointment_id, &kind, index, ReviewAction::Remove).await
}

enum ReviewAction {
    Approve,
    Unapprove,
    Remove,
}

async fn review_action(
    state: &AppState,
    appointment_id: i64,
    kind: &str,
    index: usize,
    action: ReviewAction,
) -> Response {
    let session = match find_session(state, appointment_id).await {
        Ok(session) => session,
        Err(e) => return error_response(e),
    };

    let kind = match parse_kind(kind) {
        Some(kind) => kind,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("unknown suggestion kind: {kind}"),
                }),
            )
                .into_response()
        }
    };

    let result = match action {
        ReviewAction::Approve => session.approve_suggestion(kind, index).await,
        ReviewAction::Unapprove => session.unapprove_suggestion(kind, index).await,
        ReviewAction::Remove => session.remove_suggestion(kind, index).await,
    };

    match result {
        Ok(()) => suggestions_response(&session).await,
        Err(e) => error_response(e),
    }
}

async fn suggestions_response(session: &EncounterSession) -> Response {
    let response = SuggestionsResponse {
        diagnoses: session.diagnoses().await,
        exams: session.exam_suggestions().await,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// DELETE /encounters/:appointment_id
/// Discard the session: release the device and drop transcript, evidence
/// selection, and suggestions. Nothing is archived.
pub async fn discard_encounter(
    State(state): State<AppState>,
    Path(appointment_id): Path<i64>,
) -> impl IntoResponse {
    let session = {
        let mut sessions = state.sessions.write().await;
        sessions.remove(&appointment_id)
    };

    match session {
        Some(session) => {
            session.teardown().await;
            info!("Encounter session discarded for appointment {appointment_id}");
            (
                StatusCode::OK,
                Json(ControlResponse {
                    appointment_id,
                    status: "discarded".to_string(),
                    message: "Encounter session discarded".to_string(),
                }),
            )
                .into_response()
        }
        None => error_response(CaptureError::SessionNotFound(appointment_id)),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
