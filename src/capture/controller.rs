use super::device::{CaptureDevice, MediaConstraints, MediaFragment};
use super::encoder::ChunkEncoder;
use crate::error::CaptureError;
use crate::transcript::TranscriptionDispatcher;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Lifecycle of a single recording.
///
/// Transitions are strict: `Idle -> Recording`, `Recording <-> Paused`,
/// and `Recording | Paused -> Stopped`. `Stopped` is terminal: a stopped
/// controller is never restarted, a new one is created instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    Idle,
    Recording,
    Paused,
    Stopped,
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecordingState::Idle => "idle",
            RecordingState::Recording => "recording",
            RecordingState::Paused => "paused",
            RecordingState::Stopped => "stopped",
        };
        write!(f, "{label}")
    }
}

/// Complete raw capture of one recording, handed out by [`CaptureController::stop`].
///
/// Pause gaps are absent: samples that arrived while paused were discarded
/// at intake, so this is a contiguous take.
#[derive(Debug, Clone)]
pub struct RawRecording {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl RawRecording {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Drives one recording end to end: opens the capture device, runs the
/// intake task that accumulates raw samples and cuts chunks, forwards each
/// chunk to the [`TranscriptionDispatcher`], and tracks elapsed time.
///
/// The device handle lives behind an `Option` so release happens exactly
/// once no matter how the controller goes away: `stop()`, `teardown()`,
/// and the `Drop` backstop all take it out before closing.
pub struct CaptureController {
    constraints: MediaConstraints,
    chunk_duration: Duration,
    dispatcher: Arc<TranscriptionDispatcher>,
    state: Arc<Mutex<RecordingState>>,
    device: Mutex<Option<Box<dyn CaptureDevice>>>,
    raw_samples: Arc<Mutex<Vec<i16>>>,
    started_at: Mutex<Option<DateTime<Utc>>>,
    elapsed_seconds: Arc<AtomicU64>,
    chunks_emitted: Arc<AtomicU64>,
    capture_task: Mutex<Option<JoinHandle<()>>>,
    ticker_task: Mutex<Option<JoinHandle<()>>>,
}

impl CaptureController {
    pub fn new(
        device: Box<dyn CaptureDevice>,
        constraints: MediaConstraints,
        chunk_duration: Duration,
        dispatcher: Arc<TranscriptionDispatcher>,
    ) -> Self {
        Self {
            constraints,
            chunk_duration,
            dispatcher,
            state: Arc::new(Mutex::new(RecordingState::Idle)),
            device: Mutex::new(Some(device)),
            raw_samples: Arc::new(Mutex::new(Vec::new())),
            started_at: Mutex::new(None),
            elapsed_seconds: Arc::new(AtomicU64::new(0)),
            chunks_emitted: Arc::new(AtomicU64::new(0)),
            capture_task: Mutex::new(None),
            ticker_task: Mutex::new(None),
        }
    }

    /// Open the device and begin capturing. Only valid from `Idle`.
    ///
    /// If the device cannot be opened the error is returned, the state stays
    /// `Idle`, and no handle is held, so a later retry starts from scratch.
    pub async fn start(&self) -> Result<(), CaptureError> {
        let mut state = self.state.lock().await;
        if *state != RecordingState::Idle {
            return Err(CaptureError::InvalidTransition {
                from: *state,
                action: "start",
            });
        }

        let receiver = {
            let mut device = self.device.lock().await;
            let dev = device.as_mut().ok_or_else(|| {
                CaptureError::DeviceUnavailable("capture device already released".to_string())
            })?;
            dev.open(&self.constraints).await?
        };

        *state = RecordingState::Recording;
        *self.started_at.lock().await = Some(Utc::now());

        let encoder = ChunkEncoder::new(
            self.chunk_duration,
            self.constraints.sample_rate,
            self.constraints.channels,
        );

        let capture = tokio::spawn(Self::intake_loop(
            receiver,
            encoder,
            Arc::clone(&self.state),
            Arc::clone(&self.raw_samples),
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.chunks_emitted),
        ));
        *self.capture_task.lock().await = Some(capture);

        let ticker = tokio::spawn(Self::ticker_loop(
            Arc::clone(&self.state),
            Arc::clone(&self.elapsed_seconds),
        ));
        *self.ticker_task.lock().await = Some(ticker);

        info!(
            sample_rate = self.constraints.sample_rate,
            channels = self.constraints.channels,
            "Recording started"
        );
        Ok(())
    }

    /// Suspend intake. Fragments delivered while paused are discarded, the
    /// elapsed counter freezes, and chunk numbering continues where it left
    /// off on resume. Pausing an already paused recording is a no-op.
    pub async fn pause(&self) -> Result<(), CaptureError> {
        let mut state = self.state.lock().await;
        match *state {
            RecordingState::Recording => {
                *state = RecordingState::Paused;
                info!("Recording paused");
                Ok(())
            }
            RecordingState::Paused => Ok(()),
            from => Err(CaptureError::InvalidTransition {
                from,
                action: "pause",
            }),
        }
    }

    /// Resume intake after a pause. Resuming while already recording is a
    /// no-op.
    pub async fn resume(&self) -> Result<(), CaptureError> {
        let mut state = self.state.lock().await;
        match *state {
            RecordingState::Paused => {
                *state = RecordingState::Recording;
                info!("Recording resumed");
                Ok(())
            }
            RecordingState::Recording => Ok(()),
            from => Err(CaptureError::InvalidTransition {
                from,
                action: "resume",
            }),
        }
    }

    /// Finish the recording: release the device, let the intake task flush
    /// its partial tail chunk, and hand back the accumulated raw take.
    ///
    /// Transcription requests still in flight keep running and merge their
    /// results after the fact.
    pub async fn stop(&self) -> Result<RawRecording, CaptureError> {
        {
            let mut state = self.state.lock().await;
            match *state {
                RecordingState::Recording | RecordingState::Paused => {
                    *state = RecordingState::Stopped;
                }
                from => {
                    return Err(CaptureError::InvalidTransition {
                        from,
                        action: "stop",
                    })
                }
            }
        }

        info!("Stopping recording");
        self.release_device().await;

        // Closing the device drops the fragment sender; the intake task
        // drains the channel and exits after flushing the tail chunk.
        if let Some(task) = self.capture_task.lock().await.take() {
            if let Err(e) = task.await {
                error!("Capture intake task failed: {e}");
            }
        }
        if let Some(task) = self.ticker_task.lock().await.take() {
            task.abort();
        }

        let samples = std::mem::take(&mut *self.raw_samples.lock().await);
        info!(
            samples = samples.len(),
            chunks = self.chunks_emitted.load(Ordering::SeqCst),
            "Recording stopped"
        );

        Ok(RawRecording {
            samples,
            sample_rate: self.constraints.sample_rate,
            channels: self.constraints.channels,
        })
    }

    /// Abandon the recording without producing a take. Safe to call in any
    /// state and idempotent; used when a session is discarded mid-recording.
    pub async fn teardown(&self) {
        {
            let mut state = self.state.lock().await;
            if matches!(*state, RecordingState::Recording | RecordingState::Paused) {
                info!("Tearing down active recording");
            }
            *state = RecordingState::Stopped;
        }
        if let Some(task) = self.capture_task.lock().await.take() {
            task.abort();
        }
        if let Some(task) = self.ticker_task.lock().await.take() {
            task.abort();
        }
        self.release_device().await;
    }

    async fn release_device(&self) {
        let taken = self.device.lock().await.take();
        if let Some(mut device) = taken {
            if device.is_open() {
                if let Err(e) = device.close().await {
                    error!("Failed to release capture device: {e}");
                }
            }
        }
    }

    async fn intake_loop(
        mut receiver: mpsc::Receiver<MediaFragment>,
        mut encoder: ChunkEncoder,
        state: Arc<Mutex<RecordingState>>,
        raw_samples: Arc<Mutex<Vec<i16>>>,
        dispatcher: Arc<TranscriptionDispatcher>,
        chunks_emitted: Arc<AtomicU64>,
    ) {
        info!("Capture intake task started");

        while let Some(fragment) = receiver.recv().await {
            let current = *state.lock().await;
            match current {
                RecordingState::Recording => {}
                RecordingState::Paused => continue,
                _ => break,
            }

            raw_samples.lock().await.extend_from_slice(&fragment.samples);

            for chunk in encoder.push(&fragment) {
                chunks_emitted.fetch_add(1, Ordering::SeqCst);
                dispatcher.dispatch(chunk);
            }
        }

        if let Some(chunk) = encoder.flush() {
            chunks_emitted.fetch_add(1, Ordering::SeqCst);
            dispatcher.dispatch(chunk);
        }

        info!("Capture intake task finished");
    }

    async fn ticker_loop(state: Arc<Mutex<RecordingState>>, elapsed: Arc<AtomicU64>) {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        // The first tick resolves immediately; consume it so the counter
        // advances one second after start, not at start.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match *state.lock().await {
                RecordingState::Recording => {
                    elapsed.fetch_add(1, Ordering::SeqCst);
                }
                RecordingState::Paused => {}
                _ => break,
            }
        }
    }

    pub async fn state(&self) -> RecordingState {
        *self.state.lock().await
    }

    pub async fn started_at(&self) -> Option<DateTime<Utc>> {
        *self.started_at.lock().await
    }

    /// Seconds spent actually recording, excluding time paused
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds.load(Ordering::SeqCst)
    }

    pub fn chunks_emitted(&self) -> u64 {
        self.chunks_emitted.load(Ordering::SeqCst)
    }

    pub fn dispatcher(&self) -> &Arc<TranscriptionDispatcher> {
        &self.dispatcher
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        // Backstop for controllers abandoned without stop() or teardown():
        // kill the tasks and, if a runtime is still available, close the
        // device from a spawned task since Drop cannot await.
        if let Ok(mut task) = self.capture_task.try_lock() {
            if let Some(task) = task.take() {
                task.abort();
            }
        }
        if let Ok(mut task) = self.ticker_task.try_lock() {
            if let Some(task) = task.take() {
                task.abort();
            }
        }
        if let Ok(mut device) = self.device.try_lock() {
            if let Some(mut device) = device.take() {
                if device.is_open() {
                    match tokio::runtime::Handle::try_current() {
                        Ok(handle) => {
                            handle.spawn(async move {
                                if let Err(e) = device.close().await {
                                    warn!("Failed to release capture device on drop: {e}");
                                }
                            });
                        }
                        Err(_) => {
                            warn!("Capture device dropped outside a runtime; handle leaked");
                        }
                    }
                }
            }
        }
    }
}
