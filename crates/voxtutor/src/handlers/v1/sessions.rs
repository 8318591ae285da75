//! Session lifecycle HTTP handlers.

use axum::Json;
use axum::extract::{Path as PathExtract, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::api::{EndSessionResponse, SessionActionResponse};
use crate::handlers::identity;
use crate::handlers::problem_details;
use crate::server::AppState;
use crate::session::{CreateSessionContext, SessionError, SessionStatus};

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/sessions
pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(context): Json<CreateSessionContext>,
) -> Response {
    let Some(user_id) = identity::user_id(&headers) else {
        return missing_identity();
    };

    match state.services.sessions.create_session(&user_id, context).await {
        Ok(handle) => (StatusCode::CREATED, Json(handle)).into_response(),
        Err(e) => session_problem(e),
    }
}

/// GET /api/v1/sessions/{session_id}
///
/// Always answers 200: absent sessions and ownership mismatches come back
/// as sentinel bodies, so status polling never has to special-case errors.
pub async fn get_session(
    State(state): State<AppState>,
    PathExtract(session_id): PathExtract<String>,
    headers: HeaderMap,
) -> Response {
    let Some(user_id) = identity::user_id(&headers) else {
        return missing_identity();
    };

    match state.services.sessions.get_status(&session_id, &user_id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => session_problem(e),
    }
}

/// POST /api/v1/sessions/{session_id}/pause
pub async fn pause_session(
    State(state): State<AppState>,
    PathExtract(session_id): PathExtract<String>,
    headers: HeaderMap,
) -> Response {
    let Some(user_id) = identity::user_id(&headers) else {
        return missing_identity();
    };

    match state.services.sessions.pause_session(&session_id, &user_id).await {
        Ok(()) => Json(SessionActionResponse {
            session_id,
            status: SessionStatus::Paused,
        })
        .into_response(),
        Err(e) => session_problem(e),
    }
}

/// POST /api/v1/sessions/{session_id}/resume
pub async fn resume_session(
    State(state): State<AppState>,
    PathExtract(session_id): PathExtract<String>,
    headers: HeaderMap,
) -> Response {
    let Some(user_id) = identity::user_id(&headers) else {
        return missing_identity();
    };

    match state.services.sessions.resume_session(&session_id, &user_id).await {
        Ok(()) => Json(SessionActionResponse {
            session_id,
            status: SessionStatus::Active,
        })
        .into_response(),
        Err(e) => session_problem(e),
    }
}

/// DELETE /api/v1/sessions/{session_id}
///
/// Idempotent: ending a session that is already gone reports
/// `already_ended` with the same 200 as a first-time end.
pub async fn end_session(
    State(state): State<AppState>,
    PathExtract(session_id): PathExtract<String>,
    headers: HeaderMap,
) -> Response {
    let Some(user_id) = identity::user_id(&headers) else {
        return missing_identity();
    };

    match state.services.sessions.end_session(&session_id, &user_id).await {
        Ok(outcome) => Json(EndSessionResponse {
            session_id,
            outcome,
        })
        .into_response(),
        Err(e) => session_problem(e),
    }
}

// ============================================================================
// Implementation Details
// ============================================================================

/// Map a session error onto a problem response.
pub(super) fn session_problem(e: SessionError) -> Response {
    match &e {
        SessionError::VendorUnavailable(_) => problem_details::service_unavailable(e.to_string()),
        SessionError::NotFound(_) => problem_details::not_found(e.to_string()),
        SessionError::Unauthorized(_) => problem_details::forbidden(e.to_string()),
        SessionError::InvalidTransition { .. } => problem_details::conflict(e.to_string()),
        SessionError::Persistence(_) => {
            error!(error = %e, "session persistence failure");
            problem_details::internal_error("failed to persist session state")
        }
    }
    .into_response()
}

/// Reject a request that arrived without a caller id.
pub(super) fn missing_identity() -> Response {
    problem_details::unauthorized(format!("missing {} header", identity::USER_ID_HEADER))
        .into_response()
}
