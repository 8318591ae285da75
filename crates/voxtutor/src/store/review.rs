//! Review item storage trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::learning::reviews::ReviewItem;

use super::error::StorageResult;

/// Storage interface for spaced-repetition review items.
///
/// Items are keyed by (user, content); each review submission supersedes
/// the previous scheduling state whole.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Load one item, `Ok(None)` if the user has never seen this content.
    async fn load(&self, user_id: &str, content_id: &str) -> StorageResult<Option<ReviewItem>>;

    /// Insert or replace one item.
    async fn upsert(&self, item: &ReviewItem) -> StorageResult<()>;

    /// All of a user's items due at or before `due_before`, soonest first.
    async fn list_due(
        &self,
        user_id: &str,
        due_before: DateTime<Utc>,
    ) -> StorageResult<Vec<ReviewItem>>;
}
