use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recognized piece of the encounter transcript, tied to the chunk that
/// produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Sequence number of the source chunk
    pub sequence_number: u64,

    /// Speaker label, when one is configured for the session
    pub speaker: Option<String>,

    /// Recognized text (non-empty)
    pub text: String,

    /// When the recognition result arrived
    pub received_at: DateTime<Utc>,
}

impl TranscriptSegment {
    /// Text with the speaker prefix applied when available
    pub fn rendered(&self) -> String {
        match &self.speaker {
            Some(speaker) => format!("{}: {}", speaker, self.text),
            None => self.text.clone(),
        }
    }
}

/// Ordered transcript of one session.
///
/// The ordering key is the chunk `sequence_number`, never arrival time:
/// transcription responses complete in arbitrary order, so each segment is
/// inserted at its sequence position. Once inserted, segments are never
/// reordered.
#[derive(Debug, Default)]
pub struct TranscriptBuffer {
    segments: Vec<TranscriptSegment>,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a segment at its sequence position. A duplicate sequence number
    /// (which a correct encoder never produces) replaces the earlier segment.
    pub fn insert(&mut self, segment: TranscriptSegment) {
        match self
            .segments
            .binary_search_by_key(&segment.sequence_number, |s| s.sequence_number)
        {
            Ok(pos) => self.segments[pos] = segment,
            Err(pos) => self.segments.insert(pos, segment),
        }
    }

    pub fn segments(&self) -> &[TranscriptSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Owned copy of the segments, in sequence order
    pub fn snapshot(&self) -> Vec<TranscriptSegment> {
        self.segments.clone()
    }

    /// Full transcript: segments concatenated in sequence order, each
    /// prefixed by its speaker label when available
    pub fn full_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.rendered())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
