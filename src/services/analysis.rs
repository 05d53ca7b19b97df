use crate::error::CaptureError;
use serde::{Deserialize, Serialize};

/// One-shot analysis request: the full transcript (or manual notes rendered
/// as transcript-equivalent text) plus the evidence the clinician selected
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest {
    pub transcription: String,
    pub appointment_id: i64,
    pub exam_ids: Vec<i64>,
    pub patient_context: String,
}

/// Diagnosis code entry as the analysis service returns it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcdCodeRecord {
    pub code: String,
    pub description: String,
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// Exam recommendation as the analysis service returns it.
///
/// The service is loose here: some deployments answer with structured
/// objects, others with bare name strings. Both are accepted at this
/// boundary and normalized before anything else sees them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExamRecommendationRecord {
    Detailed {
        name: String,
        #[serde(default)]
        reason: Option<String>,
    },
    Named(String),
}

/// Analysis service answer. Either list may be missing entirely.
#[derive(Debug, Default, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub icd_codes: Vec<IcdCodeRecord>,
    #[serde(default)]
    pub recommended_exams: Vec<ExamRecommendationRecord>,
}

/// Analysis service: transcript + evidence in, suggested codes and exams out
#[async_trait::async_trait]
pub trait AnalysisClient: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, CaptureError>;
}

pub struct HttpAnalysisClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAnalysisClient {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait::async_trait]
impl AnalysisClient for HttpAnalysisClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, CaptureError> {
        let response = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CaptureError::ServiceStatus {
                service: "analysis",
                status: response.status().as_u16(),
            });
        }

        Ok(response.json().await?)
    }
}
