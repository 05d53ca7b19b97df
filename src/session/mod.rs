//! Encounter session management
//!
//! This module provides the `EncounterSession` abstraction that manages:
//! - The recording lifecycle (start/pause/resume/stop)
//! - Chunked transcription dispatch and the ordered transcript
//! - Exam evidence selection
//! - Analysis orchestration and suggestion review
//! - Archival upload of the finished recording

mod config;
mod encounter;
mod persistence;

pub use config::EncounterConfig;
pub use encounter::{EncounterSession, EncounterStatus};
pub use persistence::{PersistenceState, RecordingPersistence};
