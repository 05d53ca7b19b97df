use super::device::MediaFragment;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A fixed-duration slice of the live capture, the unit of transcription
/// dispatch. Immutable once produced.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Position of this chunk in the session, starting at 0. Strictly
    /// increasing with no gaps; later used to order transcript segments.
    pub sequence_number: u64,
    /// When the chunk was cut from the stream
    pub captured_at: DateTime<Utc>,
    /// Sample rate of the payload in Hz
    pub sample_rate: u32,
    /// Number of channels in the payload
    pub channels: u16,
    /// Raw audio payload (i16 PCM, little-endian interleaved)
    pub payload: Vec<u8>,
}

impl AudioChunk {
    /// Payload duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        let samples = (self.payload.len() / 2) as u64;
        samples * 1000 / (self.sample_rate as u64 * self.channels as u64)
    }
}

/// Slices raw capture fragments into fixed-duration sequential chunks.
///
/// Pure and synchronous: accumulates samples and emits an `AudioChunk` each
/// time the configured duration is covered. Sequence numbers run 0,1,2,…
/// for the whole session with no number skipped or reused, and numbering
/// continues across pauses because paused fragments never reach the encoder.
pub struct ChunkEncoder {
    sample_rate: u32,
    channels: u16,
    /// Samples per emitted chunk
    samples_per_chunk: usize,
    next_sequence: u64,
    pending: Vec<i16>,
}

impl ChunkEncoder {
    pub fn new(chunk_duration: Duration, sample_rate: u32, channels: u16) -> Self {
        let per_second = sample_rate as u64 * channels as u64;
        let samples_per_chunk = (per_second * chunk_duration.as_millis() as u64 / 1000) as usize;

        Self {
            sample_rate,
            channels,
            samples_per_chunk: samples_per_chunk.max(1),
            next_sequence: 0,
            pending: Vec::new(),
        }
    }

    /// Feed one fragment; returns every chunk completed by it (usually none
    /// or one, more only if a single fragment spans several chunk lengths).
    pub fn push(&mut self, fragment: &MediaFragment) -> Vec<AudioChunk> {
        self.pending.extend_from_slice(&fragment.samples);

        let mut completed = Vec::new();
        while self.pending.len() >= self.samples_per_chunk {
            let rest = self.pending.split_off(self.samples_per_chunk);
            let samples = std::mem::replace(&mut self.pending, rest);
            completed.push(self.cut(samples));
        }
        completed
    }

    /// Emit whatever is pending as a final short chunk. Called on stop so the
    /// tail of the recording is still transcribed.
    pub fn flush(&mut self) -> Option<AudioChunk> {
        if self.pending.is_empty() {
            return None;
        }
        let samples = std::mem::take(&mut self.pending);
        Some(self.cut(samples))
    }

    /// Sequence number the next emitted chunk will carry
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    fn cut(&mut self, samples: Vec<i16>) -> AudioChunk {
        let payload: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();

        let chunk = AudioChunk {
            sequence_number: self.next_sequence,
            captured_at: Utc::now(),
            sample_rate: self.sample_rate,
            channels: self.channels,
            payload,
        };
        self.next_sequence += 1;
        chunk
    }
}
