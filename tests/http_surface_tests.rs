// HTTP API tests
//
// Exercise the router end to end with tower's oneshot, backed by the
// in-memory service fakes and a WAV file capture source.

mod support;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use encounter_capture::config::{
    CaptureDefaults, Config, HttpConfig, ServiceConfig, ServicesConfig,
};
use encounter_capture::http::{create_router, AppState};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use support::{write_test_wav, FakeServices};
use tempfile::TempDir;
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        service: ServiceConfig {
            name: "encounter-capture-test".to_string(),
            http: HttpConfig {
                bind: "127.0.0.1".to_string(),
                port: 0,
            },
        },
        capture: CaptureDefaults {
            sample_rate: 16000,
            channels: 1,
            chunk_secs: 1,
            language: "en-US".to_string(),
        },
        services: ServicesConfig {
            directory_url: "http://127.0.0.1:1".to_string(),
            exams_url: "http://127.0.0.1:1".to_string(),
            transcription_url: "http://127.0.0.1:1".to_string(),
            analysis_url: "http://127.0.0.1:1".to_string(),
            storage_url: "http://127.0.0.1:1".to_string(),
        },
    }
}

fn router_for(services: &FakeServices) -> Router {
    create_router(AppState::new(services.clients(), test_config()))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}

/// Start a file-backed recording for appointment 42 and assert it came up
async fn start_file_encounter(router: &Router, wav: &Path) -> Value {
    let response = router
        .clone()
        .oneshot(post_json(
            "/encounters/42/start",
            json!({"source_file": wav.to_str().unwrap()}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn test_health_endpoint() {
    let services = FakeServices::new();
    let router = router_for(&services);

    let response = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_start_unknown_appointment_returns_404() {
    let services = FakeServices::new();
    let router = router_for(&services);

    let response = router
        .oneshot(post_json(
            "/encounters/999/start",
            json!({"source_file": "/tmp/never-opened.wav"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("appointment 999 not found"));
}

#[tokio::test]
async fn test_start_without_platform_backend_returns_503() {
    let services = FakeServices::new();
    let router = router_for(&services);

    // No source_file: the request asks for the platform device, and this
    // build has none
    let response = router
        .oneshot(post_json("/encounters/42/start", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("no platform capture backend"),
        "Unexpected error body: {body}"
    );
}

#[tokio::test]
async fn test_control_without_session_returns_404() {
    let services = FakeServices::new();
    let router = router_for(&services);

    for request in [
        post("/encounters/42/pause"),
        post("/encounters/42/resume"),
        post("/encounters/42/stop"),
        get("/encounters/42/status"),
        get("/encounters/42/transcript"),
        delete("/encounters/42"),
    ] {
        let uri = request.uri().clone();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::NOT_FOUND,
            "Expected 404 for {uri}"
        );
    }
}

#[tokio::test]
async fn test_start_while_recording_conflicts() {
    let services = FakeServices::new();
    let dir = TempDir::new().unwrap();
    let wav = dir.path().join("long.wav");
    write_test_wav(&wav, 32000); // two seconds, still replaying on re-start

    let router = router_for(&services);
    start_file_encounter(&router, &wav).await;

    let response = router
        .clone()
        .oneshot(post_json(
            "/encounters/42/start",
            json!({"source_file": wav.to_str().unwrap()}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = router.clone().oneshot(delete("/encounters/42")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_bad_suggestion_kind_returns_400() {
    let services = FakeServices::new();
    let dir = TempDir::new().unwrap();
    let wav = dir.path().join("short.wav");
    write_test_wav(&wav, 1600);

    let router = router_for(&services);
    start_file_encounter(&router, &wav).await;

    let response = router
        .clone()
        .oneshot(post("/encounters/42/suggestions/bogus/0/approve"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("bogus"));
}

#[tokio::test]
async fn test_full_flow_over_http() {
    let services = FakeServices::new();
    let dir = TempDir::new().unwrap();
    let wav = dir.path().join("visit.wav");
    write_test_wav(&wav, 1600); // one tenth of a second replays quickly

    let router = router_for(&services);

    let started = start_file_encounter(&router, &wav).await;
    assert_eq!(started["appointment_id"], json!(42));
    assert_eq!(started["patient_name"], json!("Maria Souza"));
    assert_eq!(started["status"], json!("recording"));

    let response = router.clone().oneshot(get("/encounters/42/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status = body_json(response).await;
    assert_eq!(status["state"], json!("recording"));
    assert_eq!(status["persistence"], json!({"status": "not_started"}));

    let response = router.clone().oneshot(post("/encounters/42/pause")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], json!("paused"));

    let response = router.clone().oneshot(post("/encounters/42/resume")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], json!("recording"));

    let response = router.clone().oneshot(post("/encounters/42/stop")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], json!("stopped"));

    // The tail chunk's transcription lands shortly after stop
    let mut transcript = json!(null);
    for _ in 0..200 {
        let response = router
            .clone()
            .oneshot(get("/encounters/42/transcript"))
            .await
            .unwrap();
        transcript = body_json(response).await;
        if transcript["full_text"] != json!("") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(transcript["full_text"], json!("t0"));
    assert_eq!(transcript["segments"].as_array().unwrap().len(), 1);

    // Evidence listing and selection
    let response = router.clone().oneshot(get("/encounters/42/evidence")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let items = body_json(response).await;
    assert_eq!(items.as_array().unwrap().len(), 2);

    let response = router
        .clone()
        .oneshot(get("/encounters/42/evidence?query=xray"))
        .await
        .unwrap();
    let filtered = body_json(response).await;
    assert_eq!(filtered.as_array().unwrap().len(), 1);

    let response = router
        .clone()
        .oneshot(post("/encounters/42/evidence/2/toggle"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let toggled = body_json(response).await;
    let selected: Vec<&Value> = toggled
        .as_array()
        .unwrap()
        .iter()
        .filter(|item| item["selected"] == json!(true))
        .collect();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0]["id"], json!(2));

    // Analysis and review
    let response = router
        .clone()
        .oneshot(post_json(
            "/encounters/42/analyze",
            json!({"context": "penicillin allergy"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let suggestions = body_json(response).await;
    assert_eq!(suggestions["diagnoses"][0]["code"], json!("J06.9"));
    assert_eq!(suggestions["exams"][0]["name"], json!("CBC"));
    assert_eq!(suggestions["diagnoses"][0]["approved"], json!(false));

    let response = router
        .clone()
        .oneshot(post("/encounters/42/suggestions/diagnosis/0/approve"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let approved = body_json(response).await;
    assert_eq!(approved["diagnoses"][0]["approved"], json!(true));

    let response = router
        .clone()
        .oneshot(delete("/encounters/42/suggestions/exam/0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let removed = body_json(response).await;
    assert!(removed["exams"].as_array().unwrap().is_empty());

    let response = router
        .clone()
        .oneshot(post("/encounters/42/suggestions/diagnosis/5/approve"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Discard ends the session; further queries answer 404
    let response = router.clone().oneshot(delete("/encounters/42")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], json!("discarded"));

    let response = router.clone().oneshot(get("/encounters/42/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_manual_analysis_over_http() {
    let services = FakeServices::new();
    let dir = TempDir::new().unwrap();
    let wav = dir.path().join("unused.wav");
    write_test_wav(&wav, 0);

    let router = router_for(&services);
    start_file_encounter(&router, &wav).await;

    let response = router
        .clone()
        .oneshot(post_json(
            "/encounters/42/analyze/manual",
            json!({
                "anamnesis": "fever since yesterday",
                "physical_exam": "temp 38.5",
                "conduct": "antipyretics",
                "context": "no known allergies"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let suggestions = body_json(response).await;
    assert_eq!(suggestions["diagnoses"].as_array().unwrap().len(), 1);

    let request = services.analysis.last_request().expect("request recorded");
    assert!(request.transcription.contains("Anamnesis: fever since yesterday"));
}

#[tokio::test]
async fn test_analyze_while_recording_conflicts_over_http() {
    let services = FakeServices::new();
    let dir = TempDir::new().unwrap();
    let wav = dir.path().join("long.wav");
    write_test_wav(&wav, 32000);

    let router = router_for(&services);
    start_file_encounter(&router, &wav).await;

    let response = router
        .clone()
        .oneshot(post_json("/encounters/42/analyze", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    router.clone().oneshot(delete("/encounters/42")).await.unwrap();
}
