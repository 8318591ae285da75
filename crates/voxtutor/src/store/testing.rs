//! In-memory store doubles for lifecycle tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::session::{LearningSession, VoiceInteraction};

use super::error::{StorageError, StorageResult};
use super::session::SessionStore;

/// In-memory [`SessionStore`] with injectable write failures.
#[derive(Default)]
pub struct MemorySessionStore {
    records: Mutex<HashMap<String, LearningSession>>,
    interactions: Mutex<Vec<VoiceInteraction>>,
    fail_next_insert: AtomicBool,
    fail_next_append: AtomicBool,
    failing_updates: AtomicUsize,
    update_calls: AtomicUsize,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next insert fail with an I/O error.
    pub fn fail_next_insert(&self) {
        self.fail_next_insert.store(true, Ordering::SeqCst);
    }

    /// Make the next `n` updates fail with an I/O error.
    pub fn fail_updates(&self, n: usize) {
        self.failing_updates.store(n, Ordering::SeqCst);
    }

    /// Make the next append fail with an I/O error.
    pub fn fail_next_append(&self) {
        self.fail_next_append.store(true, Ordering::SeqCst);
    }

    /// How many times `update` has been called, failures included.
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// All interactions appended so far, in order.
    pub fn appended_interactions(&self) -> Vec<VoiceInteraction> {
        self.interactions.lock().unwrap().clone()
    }

    fn injected() -> StorageError {
        StorageError::file_io("memory", std::io::Error::other("injected write failure"))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, record: &LearningSession) -> StorageResult<()> {
        if self.fail_next_insert.swap(false, Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.records
            .lock()
            .unwrap()
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn update(&self, record: &LearningSession) -> StorageResult<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .failing_updates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(Self::injected());
        }
        let mut records = self.records.lock().unwrap();
        let Some(existing) = records.get(&record.id) else {
            return Err(StorageError::not_found("session", &record.id));
        };
        // Same guard as the file backend: terminal records never revert.
        if existing.status.is_terminal() && !record.status.is_terminal() {
            return Err(StorageError::terminal_overwrite("session", &record.id));
        }
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn load(&self, record_id: &str) -> StorageResult<Option<LearningSession>> {
        Ok(self.records.lock().unwrap().get(record_id).cloned())
    }

    async fn list_ids(&self) -> StorageResult<Vec<String>> {
        Ok(self.records.lock().unwrap().keys().cloned().collect())
    }

    async fn list_recent(
        &self,
        user_id: &str,
        subject: &str,
        limit: usize,
    ) -> StorageResult<Vec<LearningSession>> {
        let mut matches: Vec<LearningSession> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.user_id == user_id && r.subject.as_deref() == Some(subject))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        matches.truncate(limit);
        Ok(matches)
    }

    async fn append_interaction(&self, interaction: &VoiceInteraction) -> StorageResult<()> {
        if self.fail_next_append.swap(false, Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.interactions.lock().unwrap().push(interaction.clone());
        Ok(())
    }

    async fn load_interactions(&self, record_id: &str) -> StorageResult<Vec<VoiceInteraction>> {
        Ok(self
            .interactions
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.session_id == record_id)
            .cloned()
            .collect())
    }
}
