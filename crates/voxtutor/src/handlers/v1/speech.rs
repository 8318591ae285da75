//! Pronunciation analysis HTTP handlers.
//!
//! These endpoints are stateless: they proxy the vendor's speech analysis
//! and serve reference pronunciation data, so none of them require a
//! caller id.

use axum::Json;
use axum::extract::{Path as PathExtract, Query, State};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::Deserialize;
use tracing::error;

use crate::api::CommonMistakesResponse;
use crate::handlers::problem_details;
use crate::server::AppState;
use crate::speech::{self, SpeechError};

/// Analysis language when the caller does not name one.
const DEFAULT_LANGUAGE: &str = "en-US";

// ============================================================================
// Query Types
// ============================================================================

#[derive(Deserialize)]
pub struct AnalyzeQuery {
    /// Text the speaker was attempting, when known.
    target_text: Option<String>,
    language: Option<String>,
}

#[derive(Deserialize)]
pub struct MistakesQuery {
    target: String,
    native: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/speech/pronunciation
///
/// Body is the raw audio clip; analysis parameters ride in the query
/// string so the upload stays a single unframed octet stream.
pub async fn analyze_pronunciation(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
    audio: Bytes,
) -> Response {
    if audio.is_empty() {
        return problem_details::bad_request("empty audio body").into_response();
    }

    let language = query.language.as_deref().unwrap_or(DEFAULT_LANGUAGE);
    match state
        .services
        .speech
        .analyze_pronunciation(audio, query.target_text.as_deref(), language)
        .await
    {
        Ok(analysis) => Json(analysis).into_response(),
        Err(e) => speech_problem(e),
    }
}

/// GET /api/v1/speech/pronunciation-guide/{word}
pub async fn pronunciation_guide(
    State(state): State<AppState>,
    PathExtract(word): PathExtract<String>,
) -> Response {
    Json(state.services.speech.pronunciation_guide(&word)).into_response()
}

/// GET /api/v1/speech/common-mistakes?target=en&native=es
pub async fn common_mistakes(Query(query): Query<MistakesQuery>) -> Response {
    let mistakes = speech::common_mistakes(&query.target, &query.native);
    Json(CommonMistakesResponse {
        target_language: query.target,
        native_language: query.native,
        mistakes: mistakes.to_vec(),
    })
    .into_response()
}

// ============================================================================
// Implementation Details
// ============================================================================

/// Map a speech error onto a problem response.
fn speech_problem(e: SpeechError) -> Response {
    match &e {
        SpeechError::Vendor(_) => problem_details::service_unavailable(e.to_string()),
        SpeechError::MalformedResult(_) => {
            error!(error = %e, "vendor returned malformed analysis");
            problem_details::bad_gateway("vendor returned a malformed analysis result")
        }
    }
    .into_response()
}
