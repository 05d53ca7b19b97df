use super::suggestions::{ExamSuggestion, IcdSuggestion};
use crate::error::CaptureError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which suggestion list a review action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Diagnosis,
    Exam,
}

impl SuggestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionKind::Diagnosis => "diagnosis",
            SuggestionKind::Exam => "exam",
        }
    }
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// In-memory review surface for one session's analysis results.
///
/// Holds the diagnosis and exam suggestion lists and their approval marks.
/// A re-run of analysis replaces both lists wholesale; removal is final
/// within the session. No network side effects here.
#[derive(Debug, Default)]
pub struct SuggestionReviewStore {
    diagnoses: Vec<IcdSuggestion>,
    exams: Vec<ExamSuggestion>,
}

impl SuggestionReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in the results of an analysis run, discarding any prior lists
    /// and their approval marks.
    pub fn replace(&mut self, diagnoses: Vec<IcdSuggestion>, exams: Vec<ExamSuggestion>) {
        self.diagnoses = diagnoses;
        self.exams = exams;
    }

    pub fn diagnoses(&self) -> &[IcdSuggestion] {
        &self.diagnoses
    }

    pub fn exams(&self) -> &[ExamSuggestion] {
        &self.exams
    }

    pub fn is_empty(&self) -> bool {
        self.diagnoses.is_empty() && self.exams.is_empty()
    }

    /// Mark a suggestion approved. Approving twice is a no-op.
    pub fn approve(&mut self, kind: SuggestionKind, index: usize) -> Result<(), CaptureError> {
        self.set_approved(kind, index, true)
    }

    /// Clear a suggestion's approval mark. Idempotent.
    pub fn unapprove(&mut self, kind: SuggestionKind, index: usize) -> Result<(), CaptureError> {
        self.set_approved(kind, index, false)
    }

    /// Delete a suggestion from its list. There is no undo; indices of
    /// later entries shift down by one.
    pub fn remove(&mut self, kind: SuggestionKind, index: usize) -> Result<(), CaptureError> {
        match kind {
            SuggestionKind::Diagnosis => {
                if index >= self.diagnoses.len() {
                    return Err(Self::out_of_range(kind, index));
                }
                self.diagnoses.remove(index);
            }
            SuggestionKind::Exam => {
                if index >= self.exams.len() {
                    return Err(Self::out_of_range(kind, index));
                }
                self.exams.remove(index);
            }
        }
        Ok(())
    }

    fn set_approved(
        &mut self,
        kind: SuggestionKind,
        index: usize,
        approved: bool,
    ) -> Result<(), CaptureError> {
        match kind {
            SuggestionKind::Diagnosis => {
                let entry = self
                    .diagnoses
                    .get_mut(index)
                    .ok_or_else(|| Self::out_of_range(kind, index))?;
                entry.approved = approved;
            }
            SuggestionKind::Exam => {
                let entry = self
                    .exams
                    .get_mut(index)
                    .ok_or_else(|| Self::out_of_range(kind, index))?;
                entry.approved = approved;
            }
        }
        Ok(())
    }

    fn out_of_range(kind: SuggestionKind, index: usize) -> CaptureError {
        CaptureError::SuggestionOutOfRange {
            kind: kind.as_str(),
            index,
        }
    }
}
