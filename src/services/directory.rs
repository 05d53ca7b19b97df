use crate::error::CaptureError;
use serde::{Deserialize, Serialize};

/// Appointment resolved to the patient it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentInfo {
    pub appointment_id: i64,
    pub patient_id: i64,
    pub patient_name: String,
}

/// Appointment/patient directory: appointment id in, patient identity out
#[async_trait::async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn resolve_appointment(
        &self,
        appointment_id: i64,
    ) -> Result<AppointmentInfo, CaptureError>;
}

pub struct HttpDirectoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDirectoryClient {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait::async_trait]
impl DirectoryClient for HttpDirectoryClient {
    async fn resolve_appointment(
        &self,
        appointment_id: i64,
    ) -> Result<AppointmentInfo, CaptureError> {
        let response = self
            .client
            .get(format!("{}/appointments/{}", self.base_url, appointment_id))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CaptureError::AppointmentNotFound(appointment_id));
        }
        if !response.status().is_success() {
            return Err(CaptureError::ServiceStatus {
                service: "directory",
                status: response.status().as_u16(),
            });
        }

        Ok(response.json().await?)
    }
}
