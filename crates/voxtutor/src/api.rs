//! Shared API types used by the HTTP handlers.
//!
//! Domain types that already serialize cleanly (session handles, status
//! views, review items) go over the wire as-is; this module holds the
//! request bodies and response envelopes that exist only for the API.

use serde::{Deserialize, Serialize};

use crate::learning::ReviewItem;
use crate::session::{EndOutcome, SessionStatus};
use crate::speech::CommonMistake;

// ============================================================================
// Session Types
// ============================================================================

/// Response for pause and resume calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionActionResponse {
    pub session_id: String,
    pub status: SessionStatus,
}

/// Response for ending a session.
#[derive(Debug, Clone, Serialize)]
pub struct EndSessionResponse {
    pub session_id: String,
    pub outcome: EndOutcome,
}

// ============================================================================
// Review Types
// ============================================================================

/// Request to record one review of a piece of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReviewRequest {
    pub content_id: String,
    /// Recall quality, 0 (blackout) through 5 (perfect).
    pub quality: u8,
}

/// Response for listing due reviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DueReviewsResponse {
    pub reviews: Vec<ReviewItem>,
}

// ============================================================================
// Speech Types
// ============================================================================

/// Response for the common-mistakes lookup.
#[derive(Debug, Clone, Serialize)]
pub struct CommonMistakesResponse {
    pub target_language: String,
    pub native_language: String,
    pub mistakes: Vec<CommonMistake>,
}
