//! File-based session storage implementation.
//!
//! Stores each session as a YAML record plus a JSONL interaction log:
//! ```text
//! {sessions_dir}/
//!   {record_id}/
//!     record.yaml          # Whole-record snapshot, atomically replaced
//!     interactions.jsonl   # Append-only interaction log
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use crate::session::{LearningSession, VoiceInteraction};
use crate::store::error::{StorageError, StorageResult};
use crate::store::session::SessionStore;

/// File-based implementation of `SessionStore`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    sessions_dir: PathBuf,
    /// Serializes update cycles so the terminal check and the write that
    /// follows it cannot interleave with another update.
    update_lock: Arc<Mutex<()>>,
}

impl FileSessionStore {
    /// Create a new file session store.
    ///
    /// The sessions directory is created when the first record is stored.
    pub fn new(sessions_dir: impl Into<PathBuf>) -> Self {
        Self {
            sessions_dir: sessions_dir.into(),
            update_lock: Arc::new(Mutex::new(())),
        }
    }

    fn session_dir(&self, record_id: &str) -> PathBuf {
        self.sessions_dir.join(record_id)
    }

    fn record_path(&self, record_id: &str) -> PathBuf {
        self.session_dir(record_id).join("record.yaml")
    }

    fn interactions_path(&self, record_id: &str) -> PathBuf {
        self.session_dir(record_id).join("interactions.jsonl")
    }

    async fn ensure_session_dir(&self, record_id: &str) -> StorageResult<()> {
        let dir = self.session_dir(record_id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::file_io(&dir, e))
    }

    /// Write the record via a temp file and atomic rename.
    async fn write_record(&self, record: &LearningSession) -> StorageResult<()> {
        self.ensure_session_dir(&record.id).await?;

        let final_path = self.record_path(&record.id);
        let temp_path = self.session_dir(&record.id).join("record.yaml.tmp");

        let yaml = serde_saphyr::to_string(record)
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

#[async_trait]
impl SessionStore for FileSessionStore {
    // ========================================================================
    // Records
    // ========================================================================

    async fn insert(&self, record: &LearningSession) -> StorageResult<()> {
        self.write_record(record).await
    }

    async fn update(&self, record: &LearningSession) -> StorageResult<()> {
        let _guard = self.update_lock.lock().await;

        let Some(existing) = self.load(&record.id).await? else {
            return Err(StorageError::not_found("session", &record.id));
        };
        // A session that has ended never reverts; a stale copy loaded
        // before the terminal write is refused here.
        if existing.status.is_terminal() && !record.status.is_terminal() {
            return Err(StorageError::terminal_overwrite("session", &record.id));
        }
        self.write_record(record).await
    }

    async fn load(&self, record_id: &str) -> StorageResult<Option<LearningSession>> {
        let path = self.record_path(record_id);

        let contents = match fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::file_io(&path, e)),
        };

        let record: LearningSession = serde_saphyr::from_str(&contents)
            .map_err(|e| StorageError::file_deserialization(&path, e.to_string()))?;

        Ok(Some(record))
    }

    async fn list_ids(&self) -> StorageResult<Vec<String>> {
        let mut ids = Vec::new();

        let mut entries = match fs::read_dir(&self.sessions_dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::file_io(&self.sessions_dir, e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::file_io(&self.sessions_dir, e))?
        {
            let path = entry.path();
            if path.is_dir()
                && path.join("record.yaml").exists()
                && let Some(name) = path.file_name()
            {
                ids.push(name.to_string_lossy().to_string());
            }
        }

        Ok(ids)
    }

    async fn list_recent(
        &self,
        user_id: &str,
        subject: &str,
        limit: usize,
    ) -> StorageResult<Vec<LearningSession>> {
        let mut matching = Vec::new();

        for id in self.list_ids().await? {
            // Skip records that vanish or fail to parse mid-scan
            let Ok(Some(record)) = self.load(&id).await else {
                continue;
            };
            if record.user_id == user_id && record.subject.as_deref() == Some(subject) {
                matching.push(record);
            }
        }

        matching.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        matching.truncate(limit);
        Ok(matching)
    }

    // ========================================================================
    // Interactions (append-only)
    // ========================================================================

    async fn append_interaction(&self, interaction: &VoiceInteraction) -> StorageResult<()> {
        self.ensure_session_dir(&interaction.session_id).await?;
        let path = self.interactions_path(&interaction.session_id);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| StorageError::file_io(&path, e))?;

        let mut line = serde_json::to_string(interaction)
            .map_err(|e| StorageError::serialization(e.to_string()))?;
        line.push('\n');

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| StorageError::file_io(&path, e))?;

        // fsync for durability
        file.sync_all()
            .await
            .map_err(|e| StorageError::file_io(&path, e))?;

        Ok(())
    }

    async fn load_interactions(&self, record_id: &str) -> StorageResult<Vec<VoiceInteraction>> {
        let path = self.interactions_path(record_id);

        let file = match File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::file_io(&path, e)),
        };

        let reader = BufReader::new(file);
        let mut lines = reader.lines();
        let mut interactions = Vec::new();

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| StorageError::file_io(&path, e))?
        {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            // Skip malformed lines (crash recovery)
            let Ok(interaction) = serde_json::from_str::<VoiceInteraction>(trimmed) else {
                continue;
            };

            interactions.push(interaction);
        }

        Ok(interactions)
    }
}
