//! Integration tests for the session lifecycle: the full HTTP flow, and
//! what the on-disk records look like after a process restart.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use voxtutor::learning::DifficultyLevel;
use voxtutor::session::{
    CreateSessionContext, EndOutcome, InteractionKind, SessionManager, SessionStatus,
    VoiceInteraction,
};
use voxtutor::store::{FileSessionStore, SessionStore};

mod common;

use common::{StubGateway, test_app};

// ============================================================================
// Helpers
// ============================================================================

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn tutor_context() -> CreateSessionContext {
    CreateSessionContext::Tutor {
        subject: "math".to_string(),
        difficulty: DifficultyLevel::Intermediate,
        learning_style: "visual".to_string(),
        recent_emotion: None,
        recent_accuracy: None,
    }
}

fn file_manager(temp_dir: &TempDir) -> SessionManager {
    SessionManager::new(
        Arc::new(StubGateway::default()),
        Arc::new(FileSessionStore::new(temp_dir.path().join("sessions"))),
    )
}

// ============================================================================
// Full Lifecycle over HTTP
// ============================================================================

#[tokio::test]
async fn full_lifecycle_over_http() {
    let app = test_app();

    // Create
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/v1/sessions")
                .header("content-type", "application/json")
                .header("x-user-id", "user-1")
                .body(Body::from(r#"{"kind": "tutor", "subject": "math"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    let session_id = created["session_id"].as_str().unwrap().to_string();

    // The live session shows up in readiness
    let response = app
        .clone()
        .oneshot(Request::get("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let ready = json_body(response).await;
    assert_eq!(ready["live_sessions"], 1);

    // Pause
    let response = app
        .clone()
        .oneshot(
            Request::post(format!("/api/v1/sessions/{session_id}/pause"))
                .header("x-user-id", "user-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let paused = json_body(response).await;
    assert_eq!(paused["status"], "paused");

    // A second pause is an invalid transition
    let response = app
        .clone()
        .oneshot(
            Request::post(format!("/api/v1/sessions/{session_id}/pause"))
                .header("x-user-id", "user-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let conflict = json_body(response).await;
    assert!(
        conflict["detail"]
            .as_str()
            .unwrap()
            .contains("invalid transition")
    );

    // Resume
    let response = app
        .clone()
        .oneshot(
            Request::post(format!("/api/v1/sessions/{session_id}/resume"))
                .header("x-user-id", "user-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let resumed = json_body(response).await;
    assert_eq!(resumed["status"], "active");

    // Status poll sees the live session, vendor status attached
    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/api/v1/sessions/{session_id}"))
                .header("x-user-id", "user-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status = json_body(response).await;
    assert_eq!(status["result"], "found");
    assert_eq!(status["status"], "active");
    assert_eq!(status["kind"], "tutor");
    assert_eq!(status["interaction_count"], 0);
    assert_eq!(status["vendor_status"]["state"], "running");

    // End
    let response = app
        .clone()
        .oneshot(
            Request::delete(format!("/api/v1/sessions/{session_id}"))
                .header("x-user-id", "user-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let ended = json_body(response).await;
    assert_eq!(ended["outcome"], "ended");

    // Registry drained
    let response = app
        .clone()
        .oneshot(Request::get("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let ready = json_body(response).await;
    assert_eq!(ready["live_sessions"], 0);

    // A retried end reports success without doing anything
    let response = app
        .clone()
        .oneshot(
            Request::delete(format!("/api/v1/sessions/{session_id}"))
                .header("x-user-id", "user-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let retried = json_body(response).await;
    assert_eq!(retried["outcome"], "already_ended");

    // The poll now reports absence
    let response = app
        .oneshot(
            Request::get(format!("/api/v1/sessions/{session_id}"))
                .header("x-user-id", "user-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let gone = json_body(response).await;
    assert_eq!(gone["result"], "not_found");
}

// ============================================================================
// Ownership
// ============================================================================

#[tokio::test]
async fn ownership_is_enforced_across_users() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/v1/sessions")
                .header("content-type", "application/json")
                .header("x-user-id", "user-1")
                .body(Body::from(r#"{"kind": "tutor", "subject": "math"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    let session_id = created["session_id"].as_str().unwrap().to_string();

    // Mutations from another user are rejected
    let response = app
        .clone()
        .oneshot(
            Request::post(format!("/api/v1/sessions/{session_id}/pause"))
                .header("x-user-id", "user-2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(
            Request::delete(format!("/api/v1/sessions/{session_id}"))
                .header("x-user-id", "user-2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The status poll degrades to a sentinel instead
    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/api/v1/sessions/{session_id}"))
                .header("x-user-id", "user-2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let poll = json_body(response).await;
    assert_eq!(poll["result"], "unauthorized");

    // The owner is unaffected by the rejected attempts
    let response = app
        .oneshot(
            Request::post(format!("/api/v1/sessions/{session_id}/pause"))
                .header("x-user-id", "user-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Restart Recovery
// ============================================================================

#[tokio::test]
async fn terminal_record_survives_restart() {
    let temp_dir = TempDir::new().unwrap();

    let handle = {
        let manager = file_manager(&temp_dir);
        let handle = manager.create_session("user-1", tutor_context()).await.unwrap();
        let outcome = manager.end_session(&handle.session_id, "user-1").await.unwrap();
        assert_eq!(outcome, EndOutcome::Ended);
        handle
    };

    // A fresh process over the same directory sees the completed record.
    let store = FileSessionStore::new(temp_dir.path().join("sessions"));
    let record = store.load(&handle.record_id).await.unwrap().unwrap();
    assert_eq!(record.status, SessionStatus::Completed);
    assert_eq!(record.vendor_session_id, handle.session_id);
    assert!(record.ended_at.is_some());
    assert!(record.duration_seconds.is_some());
}

#[tokio::test]
async fn crash_leaves_record_for_offline_repair() {
    let temp_dir = TempDir::new().unwrap();

    let handle = {
        let manager = file_manager(&temp_dir);
        // Dropped without ending, as a crashed process would be
        manager.create_session("user-1", tutor_context()).await.unwrap()
    };

    // The registry is in-memory, so nothing is live after the restart and
    // a retried end is a no-op success.
    let manager = file_manager(&temp_dir);
    assert_eq!(manager.live_sessions(), 0);
    let outcome = manager.end_session(&handle.session_id, "user-1").await.unwrap();
    assert_eq!(outcome, EndOutcome::AlreadyEnded);

    // The record itself stays non-terminal on disk for offline repair.
    let record = manager.store().load(&handle.record_id).await.unwrap().unwrap();
    assert_eq!(record.status, SessionStatus::Active);
}

#[tokio::test]
async fn interaction_log_survives_restart() {
    let temp_dir = TempDir::new().unwrap();

    let handle = {
        let manager = file_manager(&temp_dir);
        let handle = manager.create_session("user-1", tutor_context()).await.unwrap();

        for (kind, text) in [
            (InteractionKind::UserSpeech, "what is a derivative?"),
            (InteractionKind::AiResponse, "the rate of change of a function"),
        ] {
            let entry = VoiceInteraction::speech(&handle.record_id, "user-1", kind, text);
            manager.store().append_interaction(&entry).await.unwrap();
        }

        manager.end_session(&handle.session_id, "user-1").await.unwrap();
        handle
    };

    let store = FileSessionStore::new(temp_dir.path().join("sessions"));
    let log = store.load_interactions(&handle.record_id).await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].kind, InteractionKind::UserSpeech);
    assert_eq!(log[0].transcript.as_deref(), Some("what is a derivative?"));
    assert_eq!(
        log[1].transcript.as_deref(),
        Some("the rate of change of a function")
    );
}
