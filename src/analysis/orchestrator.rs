use super::suggestions::{ExamSuggestion, IcdSuggestion};
use crate::error::CaptureError;
use crate::services::{AnalysisClient, AnalysisRequest};
use std::sync::Arc;
use tracing::info;

/// Structured notes typed by the clinician instead of recording.
///
/// Rendered into transcript-equivalent text so manual entry feeds the
/// same analysis contract as a recorded encounter.
#[derive(Debug, Clone, Default)]
pub struct ManualNotes {
    pub anamnesis: String,
    pub physical_exam: String,
    pub conduct: String,
}

impl ManualNotes {
    pub fn to_transcript_text(&self) -> String {
        let sections = [
            ("Anamnesis", &self.anamnesis),
            ("Physical exam", &self.physical_exam),
            ("Conduct", &self.conduct),
        ];
        sections
            .iter()
            .filter_map(|(label, value)| {
                let value = value.trim();
                if value.is_empty() {
                    None
                } else {
                    Some(format!("{label}: {value}"))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Normalized result of one analysis run.
#[derive(Debug, Default)]
pub struct AnalysisOutcome {
    pub diagnoses: Vec<IcdSuggestion>,
    pub exams: Vec<ExamSuggestion>,
}

/// Submits transcript text plus evidence to the analysis service and
/// normalizes the loosely shaped response into suggestion entities.
pub struct AnalysisOrchestrator {
    client: Arc<dyn AnalysisClient>,
}

impl AnalysisOrchestrator {
    pub fn new(client: Arc<dyn AnalysisClient>) -> Self {
        Self { client }
    }

    /// One-shot analysis call.
    ///
    /// Fails fast with [`CaptureError::NoContent`] before any network
    /// traffic when the transcript text is blank. Service and payload
    /// failures come back as [`CaptureError::AnalysisFailed`]; the caller
    /// may simply retry, each success replaces the previous suggestions.
    pub async fn analyze(
        &self,
        transcript_text: &str,
        selected_evidence_ids: Vec<i64>,
        context_text: &str,
        appointment_id: i64,
    ) -> Result<AnalysisOutcome, CaptureError> {
        let transcription = transcript_text.trim();
        if transcription.is_empty() {
            return Err(CaptureError::NoContent);
        }

        let request = AnalysisRequest {
            transcription: transcription.to_string(),
            appointment_id,
            exam_ids: selected_evidence_ids,
            patient_context: context_text.trim().to_string(),
        };

        let response = self
            .client
            .analyze(&request)
            .await
            .map_err(|e| CaptureError::AnalysisFailed(e.to_string()))?;

        let diagnoses: Vec<IcdSuggestion> = response
            .icd_codes
            .into_iter()
            .map(IcdSuggestion::from)
            .collect();
        let exams: Vec<ExamSuggestion> = response
            .recommended_exams
            .into_iter()
            .map(ExamSuggestion::from)
            .collect();

        info!(
            appointment_id,
            diagnoses = diagnoses.len(),
            exams = exams.len(),
            "Analysis produced suggestions"
        );

        Ok(AnalysisOutcome { diagnoses, exams })
    }
}
