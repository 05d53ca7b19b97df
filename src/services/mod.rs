//! Clients for the external collaborators of the capture pipeline.
//!
//! Each collaborator is a trait with an HTTP implementation, so sessions and
//! tests depend on the interface, never on the wire.

pub mod analysis;
pub mod directory;
pub mod exams;
pub mod storage;
pub mod transcription;

pub use analysis::{
    AnalysisClient, AnalysisRequest, AnalysisResponse, ExamRecommendationRecord,
    HttpAnalysisClient, IcdCodeRecord,
};
pub use directory::{AppointmentInfo, DirectoryClient, HttpDirectoryClient};
pub use exams::{ExamFileRecord, ExamStoreClient, HttpExamStoreClient};
pub use storage::{HttpRecordingStorageClient, RecordingStorageClient};
pub use transcription::{
    HttpTranscriptionClient, RecognitionHints, TranscriptionClient, TranscriptionResponse,
};

use crate::config::ServicesConfig;
use crate::error::CaptureError;
use std::sync::Arc;
use std::time::Duration;

/// Per-request timeout for every collaborator call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One handle per external collaborator, shared across sessions
#[derive(Clone)]
pub struct ServiceClients {
    pub directory: Arc<dyn DirectoryClient>,
    pub exams: Arc<dyn ExamStoreClient>,
    pub transcription: Arc<dyn TranscriptionClient>,
    pub analysis: Arc<dyn AnalysisClient>,
    pub storage: Arc<dyn RecordingStorageClient>,
}

impl ServiceClients {
    /// Build HTTP clients for every collaborator from configured base URLs
    pub fn from_config(cfg: &ServicesConfig) -> Result<Self, CaptureError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            directory: Arc::new(HttpDirectoryClient::new(
                http.clone(),
                cfg.directory_url.clone(),
            )),
            exams: Arc::new(HttpExamStoreClient::new(http.clone(), cfg.exams_url.clone())),
            transcription: Arc::new(HttpTranscriptionClient::new(
                http.clone(),
                cfg.transcription_url.clone(),
            )),
            analysis: Arc::new(HttpAnalysisClient::new(
                http.clone(),
                cfg.analysis_url.clone(),
            )),
            storage: Arc::new(HttpRecordingStorageClient::new(http, cfg.storage_url.clone())),
        })
    }
}
