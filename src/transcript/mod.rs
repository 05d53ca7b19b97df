// Transcript collection: ordered merge buffer plus the per-chunk dispatch
// pipeline that feeds it.

pub mod buffer;
pub mod dispatcher;

pub use buffer::{TranscriptBuffer, TranscriptSegment};
pub use dispatcher::TranscriptionDispatcher;
