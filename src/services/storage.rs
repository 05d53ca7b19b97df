use crate::error::CaptureError;
use reqwest::multipart;

/// Recording-storage service: accepts the final assembled media blob for
/// archival. Success or failure only; nothing is read back.
#[async_trait::async_trait]
pub trait RecordingStorageClient: Send + Sync {
    async fn upload(&self, appointment_id: i64, blob: Vec<u8>) -> Result<(), CaptureError>;
}

pub struct HttpRecordingStorageClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecordingStorageClient {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait::async_trait]
impl RecordingStorageClient for HttpRecordingStorageClient {
    async fn upload(&self, appointment_id: i64, blob: Vec<u8>) -> Result<(), CaptureError> {
        let recording = multipart::Part::bytes(blob)
            .file_name(format!("encounter-{appointment_id}.wav"))
            .mime_str("audio/wav")?;

        let form = multipart::Form::new()
            .part("recording", recording)
            .text("appointment_id", appointment_id.to_string());

        let response = self
            .client
            .post(format!("{}/recordings", self.base_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CaptureError::ServiceStatus {
                service: "recording storage",
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}
