// Shared test doubles for the encounter-capture pipeline.
//
// Every external collaborator gets a scripted in-memory fake so tests can
// run the real pipeline code without any network or audio hardware.

#![allow(dead_code)]

use encounter_capture::capture::{CaptureDevice, MediaConstraints, MediaFragment};
use encounter_capture::error::CaptureError;
use encounter_capture::services::{
    AnalysisClient, AnalysisRequest, AnalysisResponse, AppointmentInfo, DirectoryClient,
    ExamFileRecord, ExamStoreClient, RecognitionHints, RecordingStorageClient, ServiceClients,
    TranscriptionClient, TranscriptionResponse,
};
use encounter_capture::AudioChunk;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

// ============================================================================
// Capture device
// ============================================================================

/// How a scripted device reacts to open()
#[derive(Debug, Clone, Copy)]
pub enum OpenBehavior {
    Succeed,
    DenyPermission,
    NoDevice,
}

/// In-memory capture device driven by the test through a [`DeviceHandle`].
pub struct ScriptedDevice {
    behavior: OpenBehavior,
    open: bool,
    closes: Arc<AtomicUsize>,
    slot: Arc<Mutex<Option<mpsc::Sender<MediaFragment>>>>,
}

/// Test-side handle: feeds fragments in and observes releases.
#[derive(Clone)]
pub struct DeviceHandle {
    closes: Arc<AtomicUsize>,
    slot: Arc<Mutex<Option<mpsc::Sender<MediaFragment>>>>,
}

impl DeviceHandle {
    /// Push one fragment into the capture stream. Silently ignored once the
    /// device is closed, like a real callback firing after release.
    pub async fn send(&self, fragment: MediaFragment) {
        let sender = self.slot.lock().unwrap().clone();
        if let Some(sender) = sender {
            let _ = sender.send(fragment).await;
        }
    }

    /// Simulate the device reaching end of stream on its own.
    pub fn end_stream(&self) {
        self.slot.lock().unwrap().take();
    }

    /// How many times the device has been released
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

pub fn scripted_device(behavior: OpenBehavior) -> (Box<dyn CaptureDevice>, DeviceHandle) {
    let closes = Arc::new(AtomicUsize::new(0));
    let slot = Arc::new(Mutex::new(None));
    let handle = DeviceHandle {
        closes: Arc::clone(&closes),
        slot: Arc::clone(&slot),
    };
    let device = ScriptedDevice {
        behavior,
        open: false,
        closes,
        slot,
    };
    (Box::new(device), handle)
}

#[async_trait::async_trait]
impl CaptureDevice for ScriptedDevice {
    async fn open(
        &mut self,
        _constraints: &MediaConstraints,
    ) -> Result<mpsc::Receiver<MediaFragment>, CaptureError> {
        match self.behavior {
            OpenBehavior::DenyPermission => Err(CaptureError::PermissionDenied),
            OpenBehavior::NoDevice => Err(CaptureError::DeviceUnavailable(
                "no test device".to_string(),
            )),
            OpenBehavior::Succeed => {
                let (tx, rx) = mpsc::channel(64);
                *self.slot.lock().unwrap() = Some(tx);
                self.open = true;
                Ok(rx)
            }
        }
    }

    async fn close(&mut self) -> Result<(), CaptureError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.slot.lock().unwrap().take();
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// A fragment of silence at 16 kHz mono
pub fn fragment(samples: usize, timestamp_ms: u64) -> MediaFragment {
    MediaFragment {
        samples: vec![0i16; samples],
        sample_rate: 16000,
        channels: 1,
        timestamp_ms,
    }
}

// ============================================================================
// Transcription service
// ============================================================================

/// Scripted reply for one chunk sequence number
#[derive(Debug, Clone)]
pub enum ChunkReply {
    /// Recognized text, delivered after a delay (simulates network latency)
    Text(String, u64),
    /// Non-empty success flag but blank text
    Empty,
    /// success=false from the service
    Unsuccessful,
    /// Transport-level failure
    Fail,
}

/// Transcription fake: replies per sequence number, default "t{seq}" with
/// no delay. Records the order chunks were dispatched in.
pub struct FakeTranscription {
    script: Mutex<HashMap<u64, ChunkReply>>,
    dispatched: Mutex<Vec<u64>>,
}

impl FakeTranscription {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(HashMap::new()),
            dispatched: Mutex::new(Vec::new()),
        })
    }

    pub fn script(&self, sequence: u64, reply: ChunkReply) {
        self.script.lock().unwrap().insert(sequence, reply);
    }

    pub fn dispatched(&self) -> Vec<u64> {
        self.dispatched.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TranscriptionClient for FakeTranscription {
    async fn transcribe_chunk(
        &self,
        _appointment_id: i64,
        chunk: &AudioChunk,
        _hints: &RecognitionHints,
    ) -> Result<TranscriptionResponse, CaptureError> {
        let sequence = chunk.sequence_number;
        self.dispatched.lock().unwrap().push(sequence);

        let reply = self
            .script
            .lock()
            .unwrap()
            .get(&sequence)
            .cloned()
            .unwrap_or_else(|| ChunkReply::Text(format!("t{sequence}"), 0));

        match reply {
            ChunkReply::Text(text, delay_ms) => {
                if delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Ok(TranscriptionResponse {
                    success: true,
                    text: Some(text),
                })
            }
            ChunkReply::Empty => Ok(TranscriptionResponse {
                success: true,
                text: Some("   ".to_string()),
            }),
            ChunkReply::Unsuccessful => Ok(TranscriptionResponse {
                success: false,
                text: None,
            }),
            ChunkReply::Fail => Err(CaptureError::ServiceStatus {
                service: "transcription",
                status: 500,
            }),
        }
    }
}

// ============================================================================
// Directory service
// ============================================================================

pub struct FakeDirectory {
    appointments: HashMap<i64, AppointmentInfo>,
}

impl FakeDirectory {
    /// Directory that knows one appointment
    pub fn with_appointment(appointment_id: i64, patient_id: i64, name: &str) -> Arc<Self> {
        let mut appointments = HashMap::new();
        appointments.insert(
            appointment_id,
            AppointmentInfo {
                appointment_id,
                patient_id,
                patient_name: name.to_string(),
            },
        );
        Arc::new(Self { appointments })
    }
}

#[async_trait::async_trait]
impl DirectoryClient for FakeDirectory {
    async fn resolve_appointment(
        &self,
        appointment_id: i64,
    ) -> Result<AppointmentInfo, CaptureError> {
        self.appointments
            .get(&appointment_id)
            .cloned()
            .ok_or(CaptureError::AppointmentNotFound(appointment_id))
    }
}

// ============================================================================
// Exam store
// ============================================================================

pub struct FakeExamStore {
    records: Vec<ExamFileRecord>,
    fail: bool,
}

impl FakeExamStore {
    pub fn with_records(records: Vec<ExamFileRecord>) -> Arc<Self> {
        Arc::new(Self {
            records,
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            records: Vec::new(),
            fail: true,
        })
    }
}

/// Convenience exam record
pub fn exam_record(id: i64, filename: &str) -> ExamFileRecord {
    ExamFileRecord {
        id,
        filename: filename.to_string(),
        upload_date: "2024-05-01".to_string(),
        file_size: 2048,
        status: "available".to_string(),
        file_url: format!("https://files.example/exams/{id}"),
    }
}

#[async_trait::async_trait]
impl ExamStoreClient for FakeExamStore {
    async fn list_for_patient(
        &self,
        _patient_id: i64,
    ) -> Result<Vec<ExamFileRecord>, CaptureError> {
        if self.fail {
            return Err(CaptureError::ServiceStatus {
                service: "exam store",
                status: 500,
            });
        }
        Ok(self.records.clone())
    }
}

// ============================================================================
// Analysis service
// ============================================================================

/// Analysis fake: returns a scripted JSON payload and counts calls.
pub struct FakeAnalysis {
    payload: Mutex<String>,
    delay_ms: u64,
    fail: bool,
    calls: AtomicUsize,
    last_request: Mutex<Option<AnalysisRequest>>,
}

impl FakeAnalysis {
    /// Respond with the given JSON body (parsed as the service response)
    pub fn with_payload(payload: &str) -> Arc<Self> {
        Arc::new(Self {
            payload: Mutex::new(payload.to_string()),
            delay_ms: 0,
            fail: false,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    pub fn with_payload_after(payload: &str, delay_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            payload: Mutex::new(payload.to_string()),
            delay_ms,
            fail: false,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            payload: Mutex::new("{}".to_string()),
            delay_ms: 0,
            fail: true,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    pub fn set_payload(&self, payload: &str) {
        *self.payload.lock().unwrap() = payload.to_string();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<AnalysisRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AnalysisClient for FakeAnalysis {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, CaptureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        if self.fail {
            return Err(CaptureError::ServiceStatus {
                service: "analysis",
                status: 500,
            });
        }

        let payload = self.payload.lock().unwrap().clone();
        Ok(serde_json::from_str(&payload)?)
    }
}

// ============================================================================
// Recording storage
// ============================================================================

pub struct FakeStorage {
    uploads: Mutex<Vec<(i64, Vec<u8>)>>,
    fail: bool,
}

impl FakeStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            uploads: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            uploads: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn uploads(&self) -> Vec<(i64, Vec<u8>)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RecordingStorageClient for FakeStorage {
    async fn upload(&self, appointment_id: i64, blob: Vec<u8>) -> Result<(), CaptureError> {
        if self.fail {
            return Err(CaptureError::ServiceStatus {
                service: "recording storage",
                status: 500,
            });
        }
        self.uploads.lock().unwrap().push((appointment_id, blob));
        Ok(())
    }
}

// ============================================================================
// Assembly helpers
// ============================================================================

/// Bundle of fakes wired into a [`ServiceClients`]
pub struct FakeServices {
    pub directory: Arc<FakeDirectory>,
    pub exams: Arc<FakeExamStore>,
    pub transcription: Arc<FakeTranscription>,
    pub analysis: Arc<FakeAnalysis>,
    pub storage: Arc<FakeStorage>,
}

impl FakeServices {
    /// Sensible defaults: appointment 42 for patient 7, two exam records,
    /// echoing transcription, one diagnosis and one exam suggestion.
    pub fn new() -> Self {
        Self {
            directory: FakeDirectory::with_appointment(42, 7, "Maria Souza"),
            exams: FakeExamStore::with_records(vec![
                exam_record(1, "blood-panel.pdf"),
                exam_record(2, "chest-xray.png"),
            ]),
            transcription: FakeTranscription::new(),
            analysis: FakeAnalysis::with_payload(
                r#"{
                    "icd_codes": [
                        {"code": "J06.9", "description": "Acute upper respiratory infection", "confidence": 0.92}
                    ],
                    "recommended_exams": ["CBC"]
                }"#,
            ),
            storage: FakeStorage::new(),
        }
    }

    pub fn clients(&self) -> ServiceClients {
        ServiceClients {
            directory: self.directory.clone(),
            exams: self.exams.clone(),
            transcription: self.transcription.clone(),
            analysis: self.analysis.clone(),
            storage: self.storage.clone(),
        }
    }
}

/// Write a 16 kHz mono WAV with the given number of samples, for use as a
/// file capture source
pub fn write_test_wav(path: &Path, samples: usize) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..samples {
        writer.write_sample((i % 64) as i16).unwrap();
    }
    writer.finalize().unwrap();
}
