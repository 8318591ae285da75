//! Caller identity extraction.
//!
//! Authentication happens upstream; the proxy injects the caller's id into
//! every request it forwards. Handlers that touch per-user state read it
//! from here and reject requests that arrive without one.

use axum::http::HeaderMap;

/// Header carrying the authenticated caller's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller's id, if the request carries a non-empty one.
pub fn user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
