// Capture pipeline: device abstraction, chunk cutting, and the recording
// lifecycle state machine.

pub mod controller;
pub mod device;
pub mod encoder;

pub use controller::{CaptureController, RawRecording, RecordingState};
pub use device::{
    CaptureDevice, CaptureDeviceFactory, CaptureKind, CaptureSource, MediaConstraints,
    MediaFragment, WavFileDevice,
};
pub use encoder::{AudioChunk, ChunkEncoder};
