use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub capture: CaptureDefaults,
    pub services: ServicesConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Capture defaults applied when a start request leaves them out
#[derive(Debug, Deserialize)]
pub struct CaptureDefaults {
    pub sample_rate: u32,
    pub channels: u16,
    pub chunk_secs: u64,
    pub language: String,
}

/// Base URLs of the external collaborator services
#[derive(Debug, Deserialize)]
pub struct ServicesConfig {
    pub directory_url: String,
    pub exams_url: String,
    pub transcription_url: String,
    pub analysis_url: String,
    pub storage_url: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
