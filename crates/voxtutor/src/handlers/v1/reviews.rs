//! Spaced-repetition review HTTP handlers.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;
use tracing::error;

use crate::api::{DueReviewsResponse, SubmitReviewRequest};
use crate::handlers::identity;
use crate::handlers::problem_details;
use crate::learning::ReviewError;
use crate::learning::reviews::DEFAULT_DUE_LIMIT;
use crate::server::AppState;

use super::sessions::missing_identity;

// ============================================================================
// Query Types
// ============================================================================

#[derive(Deserialize)]
pub struct DueReviewsQuery {
    limit: Option<usize>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/reviews
pub async fn submit_review(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SubmitReviewRequest>,
) -> Response {
    let Some(user_id) = identity::user_id(&headers) else {
        return missing_identity();
    };

    match state
        .services
        .reviews
        .submit_review(&user_id, &req.content_id, req.quality)
        .await
    {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => review_problem(e),
    }
}

/// GET /api/v1/reviews/due
pub async fn due_reviews(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DueReviewsQuery>,
) -> Response {
    let Some(user_id) = identity::user_id(&headers) else {
        return missing_identity();
    };

    let limit = query.limit.unwrap_or(DEFAULT_DUE_LIMIT);
    match state.services.reviews.due_reviews(&user_id, Utc::now(), limit).await {
        Ok(reviews) => Json(DueReviewsResponse { reviews }).into_response(),
        Err(e) => review_problem(e),
    }
}

// ============================================================================
// Implementation Details
// ============================================================================

/// Map a review error onto a problem response.
fn review_problem(e: ReviewError) -> Response {
    match &e {
        ReviewError::InvalidQuality(_) => problem_details::bad_request(e.to_string()),
        ReviewError::Storage(_) => {
            error!(error = %e, "review persistence failure");
            problem_details::internal_error("failed to persist review state")
        }
    }
    .into_response()
}
