//! RFC 7807 problem responses.
//!
//! Every non-2xx answer the API produces goes through one of these
//! constructors, so clients can always parse errors the same way.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// A problem document as defined by RFC 7807.
#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: &'static str,
    pub title: &'static str,
    pub status: u16,
    pub detail: String,
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

fn problem(status: StatusCode, title: &'static str, detail: impl Into<String>) -> ProblemDetails {
    ProblemDetails {
        problem_type: "about:blank",
        title,
        status: status.as_u16(),
        detail: detail.into(),
    }
}

// ============================================================================
// Constructors
// ============================================================================

pub fn bad_request(detail: impl Into<String>) -> ProblemDetails {
    problem(StatusCode::BAD_REQUEST, "Bad Request", detail)
}

pub fn unauthorized(detail: impl Into<String>) -> ProblemDetails {
    problem(StatusCode::UNAUTHORIZED, "Unauthorized", detail)
}

pub fn forbidden(detail: impl Into<String>) -> ProblemDetails {
    problem(StatusCode::FORBIDDEN, "Forbidden", detail)
}

pub fn not_found(detail: impl Into<String>) -> ProblemDetails {
    problem(StatusCode::NOT_FOUND, "Not Found", detail)
}

pub fn conflict(detail: impl Into<String>) -> ProblemDetails {
    problem(StatusCode::CONFLICT, "Conflict", detail)
}

pub fn internal_error(detail: impl Into<String>) -> ProblemDetails {
    problem(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error",
        detail,
    )
}

pub fn bad_gateway(detail: impl Into<String>) -> ProblemDetails {
    problem(StatusCode::BAD_GATEWAY, "Bad Gateway", detail)
}

pub fn service_unavailable(detail: impl Into<String>) -> ProblemDetails {
    problem(StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable", detail)
}

// ============================================================================
// Tests
// ============================================================================
