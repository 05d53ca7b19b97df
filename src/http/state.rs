use crate::config::Config;
use crate::services::ServiceClients;
use crate::session::EncounterSession;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Active encounter sessions (appointment_id → session)
    pub sessions: Arc<RwLock<HashMap<i64, Arc<EncounterSession>>>>,

    /// Clients for the external collaborators
    pub clients: ServiceClients,

    /// Service configuration (capture defaults)
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(clients: ServiceClients, config: Config) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            clients,
            config: Arc::new(config),
        }
    }
}
