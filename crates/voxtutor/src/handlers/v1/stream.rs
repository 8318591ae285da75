//! Duplex voice stream handler.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path as PathExtract, Query, State};
use axum::response::Response;
use serde::Deserialize;
use tracing::debug;

use crate::handlers::identity;
use crate::server::AppState;
use crate::session::StreamRelay;

use super::sessions::{missing_identity, session_problem};

// ============================================================================
// Query Types
// ============================================================================

#[derive(Deserialize)]
pub struct StreamQuery {
    /// Caller id fallback for WebSocket clients that cannot set headers.
    user: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/sessions/{session_id}/stream
///
/// Upgrades to a WebSocket and relays frames between the client and the
/// vendor session until either side disconnects. Ownership is checked
/// before the upgrade, so an unauthorized caller never gets a socket.
pub async fn stream_session(
    State(state): State<AppState>,
    PathExtract(session_id): PathExtract<String>,
    Query(query): Query<StreamQuery>,
    headers: axum::http::HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(user_id) = identity::user_id(&headers).or(query.user) else {
        return missing_identity();
    };

    let (entry, vendor) = match state.services.sessions.attach_stream(&session_id, &user_id).await
    {
        Ok(attached) => attached,
        Err(e) => return session_problem(e),
    };

    debug!(session_id = %session_id, user_id = %user_id, "Upgrading voice stream");

    let relay = StreamRelay::new(
        state.services.sessions.clone(),
        &session_id,
        &entry.record_id,
        &user_id,
    );
    ws.on_upgrade(move |socket| relay.run(socket, vendor))
}
