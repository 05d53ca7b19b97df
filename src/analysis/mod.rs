// Analysis orchestration: one-shot suggestion generation from transcript
// or manual notes, plus the clinician review surface.

pub mod orchestrator;
pub mod review;
pub mod suggestions;

pub use orchestrator::{AnalysisOrchestrator, AnalysisOutcome, ManualNotes};
pub use review::{SuggestionKind, SuggestionReviewStore};
pub use suggestions::{ExamSuggestion, IcdSuggestion, DEFAULT_CONFIDENCE, DEFAULT_EXAM_REASON};
