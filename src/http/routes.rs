use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Recording control
        .route(
            "/encounters/:appointment_id/start",
            post(handlers::start_encounter),
        )
        .route(
            "/encounters/:appointment_id/pause",
            post(handlers::pause_encounter),
        )
        .route(
            "/encounters/:appointment_id/resume",
            post(handlers::resume_encounter),
        )
        .route(
            "/encounters/:appointment_id/stop",
            post(handlers::stop_encounter),
        )
        // Session queries
        .route(
            "/encounters/:appointment_id/status",
            get(handlers::encounter_status),
        )
        .route(
            "/encounters/:appointment_id/transcript",
            get(handlers::encounter_transcript),
        )
        // Evidence selection
        .route(
            "/encounters/:appointment_id/evidence",
            get(handlers::list_evidence),
        )
        .route(
            "/encounters/:appointment_id/evidence/:evidence_id/toggle",
            post(handlers::toggle_evidence),
        )
        // Analysis and suggestion review
        .route(
            "/encounters/:appointment_id/analyze",
            post(handlers::analyze_encounter),
        )
        .route(
            "/encounters/:appointment_id/analyze/manual",
            post(handlers::analyze_manual),
        )
        .route(
            "/encounters/:appointment_id/suggestions",
            get(handlers::list_suggestions),
        )
        .route(
            "/encounters/:appointment_id/suggestions/:kind/:index/approve",
            post(handlers::approve_suggestion),
        )
        .route(
            "/encounters/:appointment_id/suggestions/:kind/:index/unapprove",
            post(handlers::unapprove_suggestion),
        )
        .route(
            "/encounters/:appointment_id/suggestions/:kind/:index",
            delete(handlers::remove_suggestion),
        )
        // Session discard
        .route(
            "/encounters/:appointment_id",
            delete(handlers::discard_encounter),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
