use crate::capture::AudioChunk;
use crate::error::CaptureError;
use reqwest::multipart;
use serde::{Deserialize, Serialize};

/// Recognition hints sent along with every chunk.
///
/// SOAP structuring is always off for partial chunks; it only makes sense
/// for a complete transcript, which this pipeline never submits for
/// re-recognition.
#[derive(Debug, Clone, Serialize)]
pub struct RecognitionHints {
    /// Language tag, e.g. "en-US"
    pub language: String,
    /// Bias recognition toward medical terminology
    pub enhance_medical_terms: bool,
    /// Organize output into Subjective/Objective/Assessment/Plan sections
    pub structure_soap: bool,
}

impl RecognitionHints {
    /// Hints for a partial chunk in the given language
    pub fn for_chunks(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            enhance_medical_terms: true,
            structure_soap: false,
        }
    }
}

/// Transcription service answer for one chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub success: bool,
    #[serde(default)]
    pub text: Option<String>,
}

/// Transcription service: one audio chunk in, recognized text out
#[async_trait::async_trait]
pub trait TranscriptionClient: Send + Sync {
    async fn transcribe_chunk(
        &self,
        appointment_id: i64,
        chunk: &AudioChunk,
        hints: &RecognitionHints,
    ) -> Result<TranscriptionResponse, CaptureError>;
}

/// HTTP implementation: multipart upload of the chunk payload plus hint
/// fields
pub struct HttpTranscriptionClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTranscriptionClient {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait::async_trait]
impl TranscriptionClient for HttpTranscriptionClient {
    async fn transcribe_chunk(
        &self,
        appointment_id: i64,
        chunk: &AudioChunk,
        hints: &RecognitionHints,
    ) -> Result<TranscriptionResponse, CaptureError> {
        let audio = multipart::Part::bytes(chunk.payload.clone())
            .file_name(format!("chunk-{:05}.pcm", chunk.sequence_number))
            .mime_str("application/octet-stream")?;

        let form = multipart::Form::new()
            .part("audio", audio)
            .text("appointment_id", appointment_id.to_string())
            .text("sequence", chunk.sequence_number.to_string())
            .text("sample_rate", chunk.sample_rate.to_string())
            .text("channels", chunk.channels.to_string())
            .text("language", hints.language.clone())
            .text(
                "enhance_medical_terms",
                hints.enhance_medical_terms.to_string(),
            )
            .text("structure_soap", hints.structure_soap.to_string());

        let response = self
            .client
            .post(format!("{}/transcribe", self.base_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CaptureError::ServiceStatus {
                service: "transcription",
                status: response.status().as_u16(),
            });
        }

        Ok(response.json().await?)
    }
}
