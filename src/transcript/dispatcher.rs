use super::buffer::{TranscriptBuffer, TranscriptSegment};
use crate::capture::AudioChunk;
use crate::error::CaptureError;
use crate::services::{RecognitionHints, TranscriptionClient};
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Sends chunks to the transcription service and merges the results into an
/// ordered transcript.
///
/// Dispatch is fire-and-forget: any number of chunk requests may be in
/// flight at once and completion order is not guaranteed, so each result is
/// inserted at its chunk's sequence position rather than appended on
/// arrival. A failed or empty result costs only that chunk's contribution;
/// the recording itself is never interrupted.
pub struct TranscriptionDispatcher {
    client: Arc<dyn TranscriptionClient>,
    appointment_id: i64,
    hints: RecognitionHints,
    speaker_label: Option<String>,
    buffer: Arc<Mutex<TranscriptBuffer>>,
    in_flight: Arc<AtomicUsize>,
}

impl TranscriptionDispatcher {
    pub fn new(
        client: Arc<dyn TranscriptionClient>,
        appointment_id: i64,
        hints: RecognitionHints,
        speaker_label: Option<String>,
    ) -> Self {
        Self {
            client,
            appointment_id,
            hints,
            speaker_label,
            buffer: Arc::new(Mutex::new(TranscriptBuffer::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Send one chunk for recognition. Returns immediately; the result is
    /// merged (or dropped) by a spawned task.
    pub fn dispatch(&self, chunk: AudioChunk) {
        let client = Arc::clone(&self.client);
        let buffer = Arc::clone(&self.buffer);
        let in_flight = Arc::clone(&self.in_flight);
        let hints = self.hints.clone();
        let speaker = self.speaker_label.clone();
        let appointment_id = self.appointment_id;

        in_flight.fetch_add(1, Ordering::SeqCst);

        tokio::spawn(async move {
            let sequence = chunk.sequence_number;

            match Self::transcribe_one(client, appointment_id, chunk, hints, speaker).await {
                Ok(Some(segment)) => {
                    let mut buffer = buffer.lock().await;
                    buffer.insert(segment);
                    debug!(sequence, "Transcript segment merged");
                }
                Ok(None) => {
                    debug!(sequence, "Empty recognition result, nothing to merge");
                }
                Err(e) => {
                    warn!("{e}; transcript contribution dropped");
                }
            }

            in_flight.fetch_sub(1, Ordering::SeqCst);
        });
    }

    async fn transcribe_one(
        client: Arc<dyn TranscriptionClient>,
        appointment_id: i64,
        chunk: AudioChunk,
        hints: RecognitionHints,
        speaker: Option<String>,
    ) -> Result<Option<TranscriptSegment>, CaptureError> {
        let sequence = chunk.sequence_number;

        let response = client
            .transcribe_chunk(appointment_id, &chunk, &hints)
            .await
            .map_err(|e| CaptureError::TranscriptionChunkFailed {
                sequence,
                detail: e.to_string(),
            })?;

        if !response.success {
            return Err(CaptureError::TranscriptionChunkFailed {
                sequence,
                detail: "service reported failure".to_string(),
            });
        }

        let text = response.text.unwrap_or_default();
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        Ok(Some(TranscriptSegment {
            sequence_number: sequence,
            speaker,
            text: text.to_string(),
            received_at: Utc::now(),
        }))
    }

    /// Number of chunk requests currently outstanding
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub async fn segment_count(&self) -> usize {
        self.buffer.lock().await.len()
    }

    /// Owned copy of the merged segments, in sequence order
    pub async fn snapshot(&self) -> Vec<TranscriptSegment> {
        self.buffer.lock().await.snapshot()
    }

    /// Full transcript text in sequence order, speaker-prefixed where a
    /// label is configured
    pub async fn full_transcript_text(&self) -> String {
        self.buffer.lock().await.full_text()
    }
}
