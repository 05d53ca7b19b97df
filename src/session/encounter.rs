use super::config::EncounterConfig;
use super::persistence::{PersistenceState, RecordingPersistence};
use crate::analysis::{
    AnalysisOrchestrator, ExamSuggestion, IcdSuggestion, ManualNotes, SuggestionKind,
    SuggestionReviewStore,
};
use crate::capture::{CaptureController, CaptureDeviceFactory, RecordingState};
use crate::error::CaptureError;
use crate::evidence::{EvidenceSelector, ExamEvidenceItem};
use crate::services::{AppointmentInfo, RecognitionHints, ServiceClients};
use crate::transcript::{TranscriptSegment, TranscriptionDispatcher};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info};
use uuid::Uuid;

/// Snapshot of one session for the status surface
#[derive(Debug, Clone, Serialize)]
pub struct EncounterStatus {
    pub session_id: Uuid,
    pub appointment_id: i64,
    pub patient_id: i64,
    pub patient_name: String,
    pub state: RecordingState,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: u64,
    pub chunks_emitted: u64,
    pub transcript_segments: usize,
    pub transcription_in_flight: usize,
    pub persistence: PersistenceState,
}

#[derive(Default)]
struct EvidenceCell {
    loaded: bool,
    selector: EvidenceSelector,
}

/// One encounter end to end: the recording lifecycle, the growing
/// transcript, evidence selection, analysis, and suggestion review.
///
/// A session is single-use. It owns its capture controller, evidence
/// selection, and review store outright, so discarding the session
/// discards them with it. A result arriving late for a discarded session
/// lands in that stale session's store, never in a replacement's.
pub struct EncounterSession {
    session_id: Uuid,
    config: EncounterConfig,
    appointment: AppointmentInfo,
    clients: ServiceClients,
    controller: CaptureController,
    orchestrator: AnalysisOrchestrator,
    persistence: RecordingPersistence,
    persistence_state: Arc<Mutex<PersistenceState>>,
    evidence: Mutex<EvidenceCell>,
    review: Mutex<SuggestionReviewStore>,
}

impl EncounterSession {
    /// Resolve the appointment and assemble the pipeline. The capture
    /// device is created here but not opened; that happens on start.
    pub async fn create(
        config: EncounterConfig,
        clients: ServiceClients,
    ) -> Result<Self, CaptureError> {
        let appointment = clients
            .directory
            .resolve_appointment(config.appointment_id)
            .await?;

        info!(
            appointment_id = config.appointment_id,
            patient_id = appointment.patient_id,
            "Encounter session created"
        );

        let device = CaptureDeviceFactory::create(config.source.clone())?;
        let hints = RecognitionHints::for_chunks(config.language.clone());
        let dispatcher = Arc::new(TranscriptionDispatcher::new(
            Arc::clone(&clients.transcription),
            config.appointment_id,
            hints,
            config.speaker_label.clone(),
        ));
        let controller = CaptureController::new(
            device,
            config.constraints.clone(),
            config.chunk_duration,
            dispatcher,
        );
        let orchestrator = AnalysisOrchestrator::new(Arc::clone(&clients.analysis));
        let persistence = RecordingPersistence::new(Arc::clone(&clients.storage));

        Ok(Self {
            session_id: Uuid::new_v4(),
            config,
            appointment,
            clients,
            controller,
            orchestrator,
            persistence,
            persistence_state: Arc::new(Mutex::new(PersistenceState::NotStarted)),
            evidence: Mutex::new(EvidenceCell::default()),
            review: Mutex::new(SuggestionReviewStore::new()),
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn appointment_id(&self) -> i64 {
        self.config.appointment_id
    }

    pub fn patient(&self) -> &AppointmentInfo {
        &self.appointment
    }

    pub async fn state(&self) -> RecordingState {
        self.controller.state().await
    }

    pub async fn start(&self) -> Result<(), CaptureError> {
        self.controller.start().await
    }

    pub async fn pause(&self) -> Result<(), CaptureError> {
        self.controller.pause().await
    }

    pub async fn resume(&self) -> Result<(), CaptureError> {
        self.controller.resume().await
    }

    /// Stop recording and kick off the archival upload.
    ///
    /// The upload runs in its own task, in parallel with evidence selection
    /// and analysis; its outcome shows up in [`EncounterSession::status`].
    /// Transcription requests still in flight keep merging after this
    /// returns.
    pub async fn stop(&self) -> Result<(), CaptureError> {
        let recording = self.controller.stop().await?;

        let persistence = self.persistence.clone();
        let state = Arc::clone(&self.persistence_state);
        let appointment_id = self.config.appointment_id;

        *state.lock().await = PersistenceState::InFlight;
        tokio::spawn(async move {
            let result = persistence.persist(appointment_id, &recording).await;
            let mut state = state.lock().await;
            *state = match result {
                Ok(()) => PersistenceState::Completed,
                Err(e) => {
                    error!("Recording upload failed: {e}");
                    PersistenceState::Failed(e.to_string())
                }
            };
        });

        Ok(())
    }

    /// Release the device and abort capture tasks without archiving.
    /// Safe in any state; used when the session is discarded.
    pub async fn teardown(&self) {
        self.controller.teardown().await;
    }

    pub async fn status(&self) -> EncounterStatus {
        EncounterStatus {
            session_id: self.session_id,
            appointment_id: self.config.appointment_id,
            patient_id: self.appointment.patient_id,
            patient_name: self.appointment.patient_name.clone(),
            state: self.controller.state().await,
            started_at: self.controller.started_at().await,
            elapsed_seconds: self.controller.elapsed_seconds(),
            chunks_emitted: self.controller.chunks_emitted(),
            transcript_segments: self.controller.dispatcher().segment_count().await,
            transcription_in_flight: self.controller.dispatcher().in_flight(),
            persistence: self.persistence_state.lock().await.clone(),
        }
    }

    pub async fn transcript_segments(&self) -> Vec<TranscriptSegment> {
        self.controller.dispatcher().snapshot().await
    }

    pub async fn transcript_text(&self) -> String {
        self.controller.dispatcher().full_transcript_text().await
    }

    /// The patient's exam evidence, fetched from the exam store on first
    /// access and kept for the life of the session.
    pub async fn evidence_items(&self) -> Result<Vec<ExamEvidenceItem>, CaptureError> {
        let cell = self.evidence_cell().await?;
        Ok(cell.selector.items().to_vec())
    }

    /// Flip one item's selection mark and return the updated list.
    /// Unknown ids leave the list untouched.
    pub async fn toggle_evidence(&self, id: i64) -> Result<Vec<ExamEvidenceItem>, CaptureError> {
        let mut cell = self.evidence_cell().await?;
        cell.selector.toggle(id);
        Ok(cell.selector.items().to_vec())
    }

    pub async fn search_evidence(
        &self,
        query: &str,
    ) -> Result<Vec<ExamEvidenceItem>, CaptureError> {
        let cell = self.evidence_cell().await?;
        Ok(cell.selector.search(query).cloned().collect())
    }

    async fn evidence_cell(&self) -> Result<MutexGuard<'_, EvidenceCell>, CaptureError> {
        let mut cell = self.evidence.lock().await;
        if !cell.loaded {
            let records = self
                .clients
                .exams
                .list_for_patient(self.appointment.patient_id)
                .await?;
            info!(
                patient_id = self.appointment.patient_id,
                count = records.len(),
                "Loaded exam evidence"
            );
            cell.selector.replace(records);
            cell.loaded = true;
        }
        Ok(cell)
    }

    /// Submit the recorded transcript for analysis. Only valid once the
    /// recording has stopped; each successful run replaces the suggestion
    /// lists in the review store.
    pub async fn analyze_recorded(&self, context_text: &str) -> Result<(), CaptureError> {
        let state = self.controller.state().await;
        if state != RecordingState::Stopped {
            return Err(CaptureError::InvalidTransition {
                from: state,
                action: "analyze",
            });
        }

        let transcript = self.controller.dispatcher().full_transcript_text().await;
        let selected = self.evidence.lock().await.selector.selected_ids();

        let outcome = self
            .orchestrator
            .analyze(
                &transcript,
                selected,
                context_text,
                self.config.appointment_id,
            )
            .await?;

        self.review
            .lock()
            .await
            .replace(outcome.diagnoses, outcome.exams);
        Ok(())
    }

    /// Submit manually typed notes for analysis instead of a recording.
    /// Feeds the same analysis contract; blank notes fail with `NoContent`.
    pub async fn analyze_manual(
        &self,
        notes: &ManualNotes,
        context_text: &str,
    ) -> Result<(), CaptureError> {
        let transcript = notes.to_transcript_text();
        let selected = self.evidence.lock().await.selector.selected_ids();

        let outcome = self
            .orchestrator
            .analyze(
                &transcript,
                selected,
                context_text,
                self.config.appointment_id,
            )
            .await?;

        self.review
            .lock()
            .await
            .replace(outcome.diagnoses, outcome.exams);
        Ok(())
    }

    pub async fn diagnoses(&self) -> Vec<IcdSuggestion> {
        self.review.lock().await.diagnoses().to_vec()
    }

    pub async fn exam_suggestions(&self) -> Vec<ExamSuggestion> {
        self.review.lock().await.exams().to_vec()
    }

    pub async fn approve_suggestion(
        &self,
        kind: SuggestionKind,
        index: usize,
    ) -> Result<(), CaptureError> {
        self.review.lock().await.approve(kind, index)
    }

    pub async fn unapprove_suggestion(
        &self,
        kind: SuggestionKind,
        index: usize,
    ) -> Result<(), CaptureError> {
        self.review.lock().await.unapprove(kind, index)
    }

    pub async fn remove_suggestion(
        &self,
        kind: SuggestionKind,
        index: usize,
    ) -> Result<(), CaptureError> {
        self.review.lock().await.remove(kind, index)
    }
}
