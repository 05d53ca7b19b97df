use crate::error::CaptureError;
use hound::WavReader;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// What the session wants to capture. Video is an on/off capability only;
/// fragments are always PCM audio regardless, and a device that cannot
/// satisfy a video request must refuse to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    /// Microphone audio only
    Audio,
    /// Audio plus camera video
    AudioVideo,
}

/// Raw media data delivered by a capture device (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct MediaFragment {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Milliseconds since the device started delivering
    pub timestamp_ms: u64,
}

/// Requested capture parameters
#[derive(Debug, Clone)]
pub struct MediaConstraints {
    pub kind: CaptureKind,
    /// Target sample rate in Hz
    pub sample_rate: u32,
    /// Target channel count (1 = mono, 2 = stereo)
    pub channels: u16,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            kind: CaptureKind::Audio,
            sample_rate: 16000,
            channels: 1,
        }
    }
}

/// Capture device abstraction.
///
/// A device is opened once per session and delivers fragments through a
/// channel until closed. Opening is where permission and availability are
/// decided: an implementation must fail with `PermissionDenied` when the
/// user declines access and `DeviceUnavailable` when no compatible
/// device/codec exists, without holding any handle in either case.
#[async_trait::async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Open the device and start delivering fragments.
    ///
    /// Returns a channel receiver for the fragment stream.
    async fn open(
        &mut self,
        constraints: &MediaConstraints,
    ) -> Result<mpsc::Receiver<MediaFragment>, CaptureError>;

    /// Release the device handle. Idempotent release is the caller's job;
    /// implementations may assume one close per successful open.
    async fn close(&mut self) -> Result<(), CaptureError>;

    /// Whether the device currently holds a handle
    fn is_open(&self) -> bool;

    /// Device name for logging
    fn name(&self) -> &str;
}

/// Where capture input comes from
#[derive(Debug, Clone)]
pub enum CaptureSource {
    /// The platform capture subsystem
    Device,
    /// A WAV file replayed in real time (batch processing and tests)
    File(PathBuf),
}

/// Capture device factory
pub struct CaptureDeviceFactory;

impl CaptureDeviceFactory {
    pub fn create(source: CaptureSource) -> Result<Box<dyn CaptureDevice>, CaptureError> {
        match source {
            // Live device capture is provided by the host platform layer;
            // none is compiled into this service.
            CaptureSource::Device => Err(CaptureError::DeviceUnavailable(
                "no platform capture backend is compiled into this build".to_string(),
            )),
            CaptureSource::File(path) => Ok(Box::new(WavFileDevice::new(path))),
        }
    }
}

/// Fragment pacing used by the file device (100 ms per fragment)
const FILE_FRAGMENT_MS: u64 = 100;

/// Capture device backed by a WAV file.
///
/// Replays the file as a sequence of 100 ms fragments at recording pace, so
/// the rest of the pipeline behaves exactly as it would with a live device.
pub struct WavFileDevice {
    path: PathBuf,
    open: bool,
    reader_task: Option<tokio::task::JoinHandle<()>>,
}

impl WavFileDevice {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            open: false,
            reader_task: None,
        }
    }
}

#[async_trait::async_trait]
impl CaptureDevice for WavFileDevice {
    async fn open(
        &mut self,
        constraints: &MediaConstraints,
    ) -> Result<mpsc::Receiver<MediaFragment>, CaptureError> {
        if constraints.kind == CaptureKind::AudioVideo {
            return Err(CaptureError::DeviceUnavailable(
                "file capture source has no video track".to_string(),
            ));
        }

        let reader = WavReader::open(&self.path).map_err(|e| {
            CaptureError::DeviceUnavailable(format!("cannot open {}: {e}", self.path.display()))
        })?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                CaptureError::DeviceUnavailable(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                ))
            })?;

        info!(
            "File capture source opened: {} ({} Hz, {} ch, {} samples)",
            self.path.display(),
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        let (tx, rx) = mpsc::channel(32);
        let samples_per_fragment =
            (spec.sample_rate as u64 * spec.channels as u64 * FILE_FRAGMENT_MS / 1000) as usize;

        let task = tokio::spawn(async move {
            let mut timestamp_ms = 0u64;
            for window in samples.chunks(samples_per_fragment.max(1)) {
                let fragment = MediaFragment {
                    samples: window.to_vec(),
                    sample_rate: spec.sample_rate,
                    channels: spec.channels,
                    timestamp_ms,
                };
                if tx.send(fragment).await.is_err() {
                    // Receiver dropped: capture was torn down mid-file
                    return;
                }
                timestamp_ms += FILE_FRAGMENT_MS;
                tokio::time::sleep(Duration::from_millis(FILE_FRAGMENT_MS)).await;
            }
            info!("File capture source reached end of file");
        });

        self.open = true;
        self.reader_task = Some(task);
        Ok(rx)
    }

    async fn close(&mut self) -> Result<(), CaptureError> {
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        if self.open {
            self.open = false;
            info!("File capture source released: {}", self.path.display());
        } else {
            warn!("File capture source close without open");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn name(&self) -> &str {
        "wav-file"
    }
}
