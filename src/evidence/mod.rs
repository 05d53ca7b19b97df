pub mod selector;

pub use selector::{EvidenceSelector, ExamEvidenceItem};
