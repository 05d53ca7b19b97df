use crate::services::{ExamRecommendationRecord, IcdCodeRecord};
use serde::Serialize;

/// Confidence assigned when the analysis service omits one
pub const DEFAULT_CONFIDENCE: f32 = 0.8;

/// Reason attached to exam recommendations that arrive as bare names
pub const DEFAULT_EXAM_REASON: &str = "Recommended based on encounter analysis";

/// A proposed diagnostic classification code awaiting clinician approval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IcdSuggestion {
    pub code: String,
    pub description: String,
    pub confidence: f32,
    pub approved: bool,
}

impl From<IcdCodeRecord> for IcdSuggestion {
    fn from(record: IcdCodeRecord) -> Self {
        let confidence = record
            .confidence
            .unwrap_or(DEFAULT_CONFIDENCE)
            .clamp(0.0, 1.0);
        Self {
            code: record.code,
            description: record.description,
            confidence,
            approved: false,
        }
    }
}

/// A proposed follow-up exam awaiting clinician approval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamSuggestion {
    pub name: String,
    pub reason: String,
    pub approved: bool,
}

impl From<ExamRecommendationRecord> for ExamSuggestion {
    fn from(record: ExamRecommendationRecord) -> Self {
        match record {
            ExamRecommendationRecord::Detailed { name, reason } => {
                let reason = reason
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_EXAM_REASON.to_string());
                Self {
                    name,
                    reason,
                    approved: false,
                }
            }
            ExamRecommendationRecord::Named(name) => Self {
                name,
                reason: DEFAULT_EXAM_REASON.to_string(),
                approved: false,
            },
        }
    }
}
