pub mod analysis;
pub mod capture;
pub mod config;
pub mod error;
pub mod evidence;
pub mod http;
pub mod services;
pub mod session;
pub mod transcript;

pub use analysis::{
    AnalysisOrchestrator, AnalysisOutcome, ExamSuggestion, IcdSuggestion, ManualNotes,
    SuggestionKind, SuggestionReviewStore,
};
pub use capture::{
    AudioChunk, CaptureController, CaptureDevice, CaptureDeviceFactory, CaptureKind,
    CaptureSource, ChunkEncoder, MediaConstraints, MediaFragment, RawRecording, RecordingState,
};
pub use config::Config;
pub use error::CaptureError;
pub use evidence::{EvidenceSelector, ExamEvidenceItem};
pub use http::{create_router, AppState};
pub use services::ServiceClients;
pub use session::{
    EncounterConfig, EncounterSession, EncounterStatus, PersistenceState, RecordingPersistence,
};
pub use transcript::{TranscriptBuffer, TranscriptSegment, TranscriptionDispatcher};
