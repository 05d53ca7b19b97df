//! HTTP API for driving encounter capture from the clinical frontend
//!
//! This module provides a REST API over the encounter sessions:
//! - POST /encounters/:id/start|pause|resume|stop - Recording control
//! - GET /encounters/:id/status - Session status
//! - GET /encounters/:id/transcript - Accumulated transcript
//! - GET /encounters/:id/evidence - Exam evidence (?query= filters)
//! - POST /encounters/:id/evidence/:eid/toggle - Flip evidence selection
//! - POST /encounters/:id/analyze[/manual] - Request suggestions
//! - GET /encounters/:id/suggestions - Current suggestion lists
//! - POST /encounters/:id/suggestions/:kind/:idx/approve|unapprove
//! - DELETE /encounters/:id/suggestions/:kind/:idx - Remove a suggestion
//! - DELETE /encounters/:id - Discard the session
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
