use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::handlers;
use crate::learning::ReviewService;
use crate::session::SessionManager;
use crate::speech::SpeechAnalyzer;

// ============================================================================
// Runtime Services
// ============================================================================

/// Shared runtime services used by the HTTP handlers and stream relays.
#[derive(Clone)]
pub struct RuntimeServices {
    pub sessions: SessionManager,
    pub reviews: ReviewService,
    pub speech: SpeechAnalyzer,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub services: RuntimeServices,
    pub max_connections: usize,
}

// ============================================================================
// Server Setup
// ============================================================================

pub fn build_app(state: AppState, request_timeout_seconds: u64) -> Router {
    let max_connections = state.max_connections;

    // WebSocket streaming route - no request timeout (lives as long as the
    // voice session does)
    let streaming_routes = Router::new()
        .route(
            "/sessions/{session_id}/stream",
            get(handlers::v1::stream_session),
        )
        .with_state(state.clone());

    // Regular API routes - with request timeout
    let api_routes = Router::new()
        .route("/sessions", post(handlers::v1::create_session))
        .route(
            "/sessions/{session_id}",
            get(handlers::v1::get_session).delete(handlers::v1::end_session),
        )
        .route(
            "/sessions/{session_id}/pause",
            post(handlers::v1::pause_session),
        )
        .route(
            "/sessions/{session_id}/resume",
            post(handlers::v1::resume_session),
        )
        .route("/reviews", post(handlers::v1::submit_review))
        .route("/reviews/due", get(handlers::v1::due_reviews))
        .route(
            "/speech/pronunciation",
            post(handlers::v1::analyze_pronunciation),
        )
        .route(
            "/speech/pronunciation-guide/{word}",
            get(handlers::v1::pronunciation_guide),
        )
        .route(
            "/speech/common-mistakes",
            get(handlers::v1::common_mistakes),
        )
        .with_state(state.clone())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(request_timeout_seconds),
        ));

    let api_v1 = Router::new()
        .merge(streaming_routes)
        .merge(api_routes)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // 10 MB, audio uploads
        .layer(ConcurrencyLimitLayer::new(max_connections));

    Router::new()
        .route("/livez", get(handlers::livez))
        .route("/readyz", get(handlers::readyz))
        .route("/version", get(handlers::version))
        .with_state(state)
        .nest("/api/v1", api_v1)
}
