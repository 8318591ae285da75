//! Review items and the review scheduling service.
//!
//! Glues the pure SM-2 computation to persistence: loads (or seeds) the
//! item, applies the review, derives the next due date, and writes the
//! superseding state back.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::store::{ReviewStore, StorageError};

use super::spaced_repetition::{InvalidQuality, MAX_QUALITY, compute_next_review};

/// Ease factor assigned to an item on first exposure.
pub const SEED_EASE_FACTOR: f64 = 2.5;

/// Default cap on a due-review listing.
pub const DEFAULT_DUE_LIMIT: usize = 20;

// ============================================================================
// Review Items
// ============================================================================

/// Scheduling state for one piece of learnable content for one user.
///
/// Created on first exposure, mutated exactly once per review submission,
/// never deleted — each submission supersedes the previous state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub user_id: String,
    pub content_id: String,
    /// Grade of the most recent review (0-5).
    pub quality: u8,
    /// Consecutive qualifying reviews; resets to 0 on failure.
    pub repetitions: u32,
    /// Interval growth rate, never below 1.3.
    pub ease_factor: f64,
    /// Days between the last review and the next, never below 1.
    pub interval_days: u32,
    pub due_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl ReviewItem {
    /// Fresh item for content the user has just been exposed to:
    /// immediately due, no repetitions yet.
    pub fn seed(
        user_id: impl Into<String>,
        content_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            content_id: content_id.into(),
            quality: 0,
            repetitions: 0,
            ease_factor: SEED_EASE_FACTOR,
            interval_days: 1,
            due_at: now,
            last_reviewed_at: None,
        }
    }
}

// ============================================================================
// Service
// ============================================================================

/// Errors from review scheduling operations.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    InvalidQuality(#[from] InvalidQuality),

    #[error("review storage failure: {0}")]
    Storage(#[from] StorageError),
}

/// Applies review submissions against the review store.
#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn ReviewStore>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self { store }
    }

    /// Record one review of `content_id` and schedule the next one.
    ///
    /// Quality is validated before any store interaction. Items the user
    /// has never reviewed are seeded on the fly, so a first-ever review
    /// behaves like reviewing a fresh item.
    pub async fn submit_review(
        &self,
        user_id: &str,
        content_id: &str,
        quality: u8,
    ) -> Result<ReviewItem, ReviewError> {
        if quality > MAX_QUALITY {
            return Err(InvalidQuality { quality }.into());
        }

        let now = Utc::now();
        let mut item = self
            .store
            .load(user_id, content_id)
            .await?
            .unwrap_or_else(|| ReviewItem::seed(user_id, content_id, now));

        let next = compute_next_review(
            quality,
            item.repetitions,
            item.ease_factor,
            item.interval_days,
        )?;

        item.quality = quality;
        item.repetitions = next.repetitions;
        item.ease_factor = next.ease_factor;
        item.interval_days = next.interval_days;
        item.due_at = now + Duration::days(i64::from(next.interval_days));
        item.last_reviewed_at = Some(now);

        self.store.upsert(&item).await?;

        debug!(
            user_id = %user_id,
            content_id = %content_id,
            quality,
            interval_days = item.interval_days,
            "Review scheduled"
        );

        Ok(item)
    }

    /// Items due for review at `now`, soonest first, capped at `limit`.
    pub async fn due_reviews(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ReviewItem>, ReviewError> {
        let mut items = self.store.list_due(user_id, now).await?;
        items.truncate(limit);
        Ok(items)
    }
}
