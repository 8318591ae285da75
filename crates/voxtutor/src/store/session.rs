//! Session storage trait.
//!
//! Defines the interface for persisting session records and their
//! append-only interaction logs. A session record is written whole on
//! every update (single-record read-modify-write); interactions are only
//! ever appended.

use async_trait::async_trait;

use crate::session::{LearningSession, VoiceInteraction};

use super::error::StorageResult;

/// Storage interface for learning sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    // ========================================================================
    // Records
    // ========================================================================

    /// Persist a new session record.
    ///
    /// The record must be durable before this returns.
    async fn insert(&self, record: &LearningSession) -> StorageResult<()>;

    /// Replace an existing session record.
    ///
    /// Must be atomic with respect to concurrent readers of the same id,
    /// and must refuse to overwrite a terminal record with a non-terminal
    /// one: a stale writer that loaded the record before it ended may not
    /// revert the terminal transition. Refused writes fail with
    /// `StorageError::TerminalOverwrite`.
    async fn update(&self, record: &LearningSession) -> StorageResult<()>;

    /// Load a session record by record id.
    ///
    /// Returns `Ok(None)` if no such record exists.
    async fn load(&self, record_id: &str) -> StorageResult<Option<LearningSession>>;

    /// List the record ids of all persisted sessions.
    async fn list_ids(&self) -> StorageResult<Vec<String>>;

    /// Most recent session records for a (user, subject) pair, newest
    /// first. Feeds the rolling-performance derivation.
    async fn list_recent(
        &self,
        user_id: &str,
        subject: &str,
        limit: usize,
    ) -> StorageResult<Vec<LearningSession>>;

    // ========================================================================
    // Interactions (append-only)
    // ========================================================================

    /// Append one interaction to a session's log.
    async fn append_interaction(&self, interaction: &VoiceInteraction) -> StorageResult<()>;

    /// Load a session's interaction log in append order.
    async fn load_interactions(&self, record_id: &str) -> StorageResult<Vec<VoiceInteraction>>;
}
