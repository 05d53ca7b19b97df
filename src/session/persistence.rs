use crate::capture::RawRecording;
use crate::error::CaptureError;
use crate::services::RecordingStorageClient;
use hound::{SampleFormat, WavSpec, WavWriter};
use serde::Serialize;
use std::io::Cursor;
use std::sync::Arc;
use tracing::{info, warn};

/// Where the one-shot upload of a finished recording stands.
///
/// Upload runs in a spawned task after stop, so its outcome is surfaced
/// through session status rather than the stop call itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum PersistenceState {
    NotStarted,
    InFlight,
    Completed,
    Failed(String),
}

/// Renders a finished take as a WAV blob and uploads it to recording
/// storage, tagged with the appointment id.
#[derive(Clone)]
pub struct RecordingPersistence {
    storage: Arc<dyn RecordingStorageClient>,
}

impl RecordingPersistence {
    pub fn new(storage: Arc<dyn RecordingStorageClient>) -> Self {
        Self { storage }
    }

    /// Upload one finished recording. An empty take is skipped, there is
    /// nothing worth archiving.
    ///
    /// Failure is reported to the caller and nothing else: the transcript
    /// and any suggestions are unaffected.
    pub async fn persist(
        &self,
        appointment_id: i64,
        recording: &RawRecording,
    ) -> Result<(), CaptureError> {
        if recording.is_empty() {
            warn!(appointment_id, "Recording is empty, skipping upload");
            return Ok(());
        }

        let blob = Self::encode_wav(recording)
            .map_err(|e| CaptureError::PersistenceFailed(e.to_string()))?;

        info!(
            appointment_id,
            bytes = blob.len(),
            seconds = recording.duration_seconds(),
            "Uploading encounter recording"
        );

        self.storage
            .upload(appointment_id, blob)
            .await
            .map_err(|e| CaptureError::PersistenceFailed(e.to_string()))?;

        info!(appointment_id, "Encounter recording archived");
        Ok(())
    }

    fn encode_wav(recording: &RawRecording) -> Result<Vec<u8>, hound::Error> {
        let spec = WavSpec {
            channels: recording.channels,
            sample_rate: recording.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec)?;
            for sample in &recording.samples {
                writer.write_sample(*sample)?;
            }
            writer.finalize()?;
        }
        Ok(cursor.into_inner())
    }
}
