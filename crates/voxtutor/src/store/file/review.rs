//! File-based review storage implementation.
//!
//! Stores each user's review items as a single YAML document:
//! ```text
//! {reviews_dir}/
//!   {user_id}.yaml   # All review items for one user, atomically replaced
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;

use crate::learning::ReviewItem;
use crate::store::error::{StorageError, StorageResult};
use crate::store::review::ReviewStore;

/// On-disk document holding every review item for one user.
#[derive(Debug, Default, Serialize, Deserialize)]
struct UserReviews {
    items: Vec<ReviewItem>,
}

/// File-based implementation of `ReviewStore`.
#[derive(Debug)]
pub struct FileReviewStore {
    reviews_dir: PathBuf,
    /// Serializes read-modify-write cycles across concurrent upserts.
    write_lock: Mutex<()>,
}

impl FileReviewStore {
    /// Create a new file review store.
    ///
    /// The reviews directory is created when the first item is stored.
    pub fn new(reviews_dir: impl Into<PathBuf>) -> Self {
        Self {
            reviews_dir: reviews_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn user_path(&self, user_id: &str) -> PathBuf {
        self.reviews_dir.join(format!("{}.yaml", safe_name(user_id)))
    }

    async fn load_user(&self, user_id: &str) -> StorageResult<UserReviews> {
        let path = self.user_path(user_id);

        let contents = match fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(UserReviews::default());
            }
            Err(e) => return Err(StorageError::file_io(&path, e)),
        };

        serde_saphyr::from_str(&contents)
            .map_err(|e| StorageError::file_deserialization(&path, e.to_string()))
    }

    /// Write the user document via a temp file and atomic rename.
    async fn write_user(&self, user_id: &str, reviews: &UserReviews) -> StorageResult<()> {
        fs::create_dir_all(&self.reviews_dir)
            .await
            .map_err(|e| StorageError::file_io(&self.reviews_dir, e))?;

        let final_path = self.user_path(user_id);
        let temp_path = final_path.with_extension("yaml.tmp");

        let yaml = serde_saphyr::to_string(reviews)
            .map_err(|e| StorageError::serialization(e.to_string()))?;

        fs::write(&temp_path, yaml.as_bytes())
            .await
            .map_err(|e| StorageError::file_io(&temp_path, e))?;

        fs::rename(&temp_path, &final_path)
            .await
            .map_err(|e| StorageError::file_io(&final_path, e))?;

        Ok(())
    }
}

/// Percent-encode a user id into a filesystem-safe file name.
///
/// Every byte outside `[A-Za-z0-9._-]` becomes `%XX`, so the mapping is
/// injective: distinct user ids never share a file.
fn safe_name(user_id: &str) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(user_id.len());
    for byte in user_id.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' => {
                out.push(byte as char);
            }
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

#[async_trait]
impl ReviewStore for FileReviewStore {
    async fn load(&self, user_id: &str, content_id: &str) -> StorageResult<Option<ReviewItem>> {
        let reviews = self.load_user(user_id).await?;
        Ok(reviews
            .items
            .into_iter()
            .find(|item| item.content_id == content_id))
    }

    async fn upsert(&self, item: &ReviewItem) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut reviews = self.load_user(&item.user_id).await?;
        match reviews
            .items
            .iter_mut()
            .find(|existing| existing.content_id == item.content_id)
        {
            Some(existing) => *existing = item.clone(),
            None => reviews.items.push(item.clone()),
        }

        self.write_user(&item.user_id, &reviews).await
    }

    async fn list_due(
        &self,
        user_id: &str,
        due_before: chrono::DateTime<chrono::Utc>,
    ) -> StorageResult<Vec<ReviewItem>> {
        let reviews = self.load_user(user_id).await?;

        let mut due: Vec<ReviewItem> = reviews
            .items
            .into_iter()
            .filter(|item| item.due_at <= due_before)
            .collect();
        due.sort_by(|a, b| a.due_at.cmp(&b.due_at));
        Ok(due)
    }
}
