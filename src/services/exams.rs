use crate::error::CaptureError;
use serde::{Deserialize, Serialize};

/// Exam file entry as the exam/file store lists it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamFileRecord {
    pub id: i64,
    pub filename: String,
    pub upload_date: String,
    pub file_size: u64,
    pub status: String,
    pub file_url: String,
}

/// Exam/file store: lists a patient's existing exam files
#[async_trait::async_trait]
pub trait ExamStoreClient: Send + Sync {
    async fn list_for_patient(&self, patient_id: i64) -> Result<Vec<ExamFileRecord>, CaptureError>;
}

pub struct HttpExamStoreClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpExamStoreClient {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait::async_trait]
impl ExamStoreClient for HttpExamStoreClient {
    async fn list_for_patient(&self, patient_id: i64) -> Result<Vec<ExamFileRecord>, CaptureError> {
        let response = self
            .client
            .get(format!("{}/patients/{}/exams", self.base_url, patient_id))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CaptureError::ServiceStatus {
                service: "exam store",
                status: response.status().as_u16(),
            });
        }

        Ok(response.json().await?)
    }
}
