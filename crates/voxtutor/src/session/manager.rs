//! Session lifecycle management.
//!
//! The manager owns every persisted state change of a [`LearningSession`]
//! and coordinates three worlds that can disagree: the remote vendor
//! session, the persisted record, and the in-memory registry of live
//! sessions. All vendor calls are single attempts; a failed call leaves
//! local state untouched so the whole operation can be retried.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::learning::difficulty::{
    AdaptivePlan, DifficultyLevel, PERFORMANCE_WINDOW, performance_from_recent,
};
use crate::store::SessionStore;
use crate::vendor::{VendorGateway, VendorStream};

use super::error::{Result, SessionError};
use super::profiles;
use super::registry::{ActiveSession, ActiveSessions};
use super::types::{
    EndOutcome, ExamPrepConfig, LanguagePracticeConfig, LearningSession, PronunciationConfig,
    SessionConfig, SessionHandle, SessionStatus, SessionStatusReport, SessionStatusView,
    TutorConfig,
};

/// Language used for tutor sessions.
const TUTOR_LANGUAGE: &str = "en-US";

/// Emotion label assumed when the client reports none.
const DEFAULT_EMOTION: &str = "neutral";

/// Accuracy assumed when the client reports none.
const DEFAULT_ACCURACY: f64 = 0.7;

/// Question count for exam-prep sessions when the client omits it.
fn default_question_count() -> u32 {
    10
}

fn default_learning_style() -> String {
    "visual".to_string()
}

// ============================================================================
// Creation Contexts
// ============================================================================

/// Per-kind creation parameters, as received from the client.
///
/// For tutor sessions the requested difficulty is a starting point only;
/// the adaptive engine may promote or demote it based on recent history.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CreateSessionContext {
    Tutor {
        subject: String,
        #[serde(default)]
        difficulty: DifficultyLevel,
        #[serde(default = "default_learning_style")]
        learning_style: String,
        /// Most recent detected emotion, if the client has one to report.
        #[serde(default)]
        recent_emotion: Option<String>,
        /// Accuracy over the client's recent exercises, if known.
        #[serde(default)]
        recent_accuracy: Option<f64>,
    },
    LanguagePractice {
        target_language: String,
        native_language: String,
        scenario: String,
        #[serde(default)]
        proficiency: DifficultyLevel,
    },
    ExamPrep {
        exam: String,
        topics: Vec<String>,
        #[serde(default = "default_question_count")]
        question_count: u32,
        #[serde(default)]
        difficulty: DifficultyLevel,
    },
    Pronunciation {
        language: String,
        #[serde(default)]
        focus_areas: Vec<String>,
    },
}

// ============================================================================
// Session Manager
// ============================================================================

/// Owner of the session lifecycle state machine.
///
/// Cheap to clone; all clones share the same registry and collaborators.
#[derive(Clone)]
pub struct SessionManager {
    gateway: Arc<dyn VendorGateway>,
    store: Arc<dyn SessionStore>,
    registry: ActiveSessions,
}

impl SessionManager {
    /// Create a new session manager.
    pub fn new(gateway: Arc<dyn VendorGateway>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            gateway,
            store,
            registry: ActiveSessions::new(),
        }
    }

    /// Get a reference to the session store.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Number of sessions currently in the Active or Paused window.
    pub fn live_sessions(&self) -> usize {
        self.registry.len()
    }

    // ------------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------------

    /// Create a remote session, persist its record, and register it live.
    ///
    /// If persisting the record fails after the vendor session exists, the
    /// orphaned vendor session is ended best-effort before the error is
    /// surfaced; nothing is registered in that case.
    pub async fn create_session(
        &self,
        user_id: &str,
        context: CreateSessionContext,
    ) -> Result<SessionHandle> {
        let config = self.build_config(user_id, &context).await?;
        let scenario_context = match &config {
            SessionConfig::LanguagePractice(c) => profiles::scenario_context(&c.scenario),
            _ => None,
        };

        let vendor_session_id = self.gateway.create_voice_session(&config).await?;
        let record = LearningSession::new(user_id, &vendor_session_id, config, Utc::now());

        if let Err(e) = self.store.insert(&record).await {
            error!(
                session_id = %vendor_session_id,
                record_id = %record.id,
                error = %e,
                "Failed to persist session record, ending orphaned vendor session"
            );
            if let Err(end_err) = self.gateway.end_voice_session(&vendor_session_id).await {
                warn!(
                    session_id = %vendor_session_id,
                    error = %end_err,
                    "Compensating vendor end failed; remote session may be orphaned"
                );
            }
            return Err(e.into());
        }

        self.registry.insert(
            &vendor_session_id,
            ActiveSession {
                record_id: record.id.clone(),
                user_id: user_id.to_string(),
                started_at: record.started_at,
            },
        );

        info!(
            session_id = %vendor_session_id,
            record_id = %record.id,
            kind = %record.kind,
            user_id = %user_id,
            "Session created"
        );

        Ok(SessionHandle {
            session_id: vendor_session_id.clone(),
            record_id: record.id,
            stream_endpoint: format!("/api/v1/sessions/{}/stream", vendor_session_id),
            status: SessionStatus::Active,
            config: record.config,
            scenario_context,
        })
    }

    /// Build the vendor configuration for a creation request.
    async fn build_config(
        &self,
        user_id: &str,
        context: &CreateSessionContext,
    ) -> Result<SessionConfig> {
        Ok(match context {
            CreateSessionContext::Tutor {
                subject,
                difficulty,
                learning_style,
                recent_emotion,
                recent_accuracy,
            } => {
                let plan = self
                    .tutor_plan(
                        user_id,
                        subject,
                        *difficulty,
                        recent_emotion.as_deref(),
                        *recent_accuracy,
                    )
                    .await?;
                debug!(
                    user_id = %user_id,
                    subject = %subject,
                    requested = %difficulty,
                    adapted = %plan.difficulty,
                    performance = plan.performance_score,
                    "Tutor difficulty adapted"
                );
                SessionConfig::Tutor(TutorConfig {
                    subject: subject.clone(),
                    difficulty: plan.difficulty,
                    learning_style: learning_style.clone(),
                    personality: profiles::tutor_personality(subject, learning_style),
                    voice_id: profiles::tutor_voice(subject).to_string(),
                    language: TUTOR_LANGUAGE.to_string(),
                    pace: plan.pace,
                    features: profiles::TUTOR_FEATURES.iter().map(|s| s.to_string()).collect(),
                    extras: BTreeMap::new(),
                })
            }
            CreateSessionContext::LanguagePractice {
                target_language,
                native_language,
                scenario,
                proficiency,
            } => SessionConfig::LanguagePractice(LanguagePracticeConfig {
                target_language: target_language.clone(),
                native_language: native_language.clone(),
                scenario: scenario.clone(),
                proficiency: *proficiency,
                correction_style: profiles::DEFAULT_CORRECTION_STYLE.to_string(),
                voice_id: profiles::practice_voice(target_language),
                features: profiles::PRACTICE_FEATURES.iter().map(|s| s.to_string()).collect(),
                extras: BTreeMap::new(),
            }),
            CreateSessionContext::ExamPrep {
                exam,
                topics,
                question_count,
                difficulty,
            } => SessionConfig::ExamPrep(ExamPrepConfig {
                exam: exam.clone(),
                topics: topics.clone(),
                question_count: *question_count,
                difficulty: *difficulty,
                extras: BTreeMap::new(),
            }),
            CreateSessionContext::Pronunciation {
                language,
                focus_areas,
            } => SessionConfig::Pronunciation(PronunciationConfig {
                language: language.clone(),
                focus_areas: focus_areas.clone(),
                extras: BTreeMap::new(),
            }),
        })
    }

    /// Derive the adaptive plan for a tutor session from recent history.
    async fn tutor_plan(
        &self,
        user_id: &str,
        subject: &str,
        requested: DifficultyLevel,
        emotion: Option<&str>,
        accuracy: Option<f64>,
    ) -> Result<AdaptivePlan> {
        let recent = self
            .store
            .list_recent(user_id, subject, PERFORMANCE_WINDOW)
            .await?;
        let scores: Vec<Option<f64>> = recent.iter().map(|s| s.comprehension_score).collect();
        let performance = performance_from_recent(&scores);

        Ok(AdaptivePlan::new(
            requested,
            performance,
            emotion.unwrap_or(DEFAULT_EMOTION),
            accuracy.unwrap_or(DEFAULT_ACCURACY),
        ))
    }

    // ------------------------------------------------------------------------
    // Pause / Resume
    // ------------------------------------------------------------------------

    /// Pause a live session. Valid only from Active.
    pub async fn pause_session(&self, session_id: &str, user_id: &str) -> Result<()> {
        let entry = self.lookup(session_id, user_id)?;
        let mut record = self.load_record(session_id, &entry.record_id).await?;

        if !record.status.can_transition_to(SessionStatus::Paused) {
            return Err(SessionError::invalid_transition(
                session_id,
                record.status,
                SessionStatus::Paused,
            ));
        }

        // Vendor first. If it fails nothing has changed locally.
        self.gateway.pause_voice_session(session_id).await?;

        record.status = SessionStatus::Paused;
        self.store.update(&record).await?;

        info!(session_id = %session_id, "Session paused");
        Ok(())
    }

    /// Resume a paused session. Valid only from Paused.
    pub async fn resume_session(&self, session_id: &str, user_id: &str) -> Result<()> {
        let entry = self.lookup(session_id, user_id)?;
        let mut record = self.load_record(session_id, &entry.record_id).await?;

        if !record.status.can_transition_to(SessionStatus::Active) {
            return Err(SessionError::invalid_transition(
                session_id,
                record.status,
                SessionStatus::Active,
            ));
        }

        self.gateway.resume_voice_session(session_id).await?;

        record.status = SessionStatus::Active;
        self.store.update(&record).await?;

        info!(session_id = %session_id, "Session resumed");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Ending
    // ------------------------------------------------------------------------

    /// End a session at the owner's request.
    ///
    /// Idempotent: ending a session that is absent from the registry (never
    /// existed, already ended, or swept) reports [`EndOutcome::AlreadyEnded`]
    /// as success, since network retries on disconnect are expected.
    pub async fn end_session(&self, session_id: &str, user_id: &str) -> Result<EndOutcome> {
        match self.registry.get(session_id) {
            None => Ok(EndOutcome::AlreadyEnded),
            Some(entry) if entry.user_id != user_id => {
                Err(SessionError::Unauthorized(session_id.to_string()))
            }
            Some(_) => self.finalize(session_id, SessionStatus::Completed).await,
        }
    }

    /// Drive a session to a terminal status, exactly once per session id.
    ///
    /// The atomic registry removal is the finalization gate: whichever of a
    /// racing explicit end, relay disconnect, or expiry sweep removes the
    /// entry performs the terminal write; everyone else sees `AlreadyEnded`.
    /// The vendor end is best-effort (the remote side may already be gone).
    /// The terminal write is retried once; a second failure leaves the
    /// record non-terminal for offline repair and surfaces the error.
    pub async fn finalize(&self, session_id: &str, status: SessionStatus) -> Result<EndOutcome> {
        let Some(entry) = self.registry.remove(session_id) else {
            return Ok(EndOutcome::AlreadyEnded);
        };

        if let Err(e) = self.gateway.end_voice_session(session_id).await {
            warn!(
                session_id = %session_id,
                error = %e,
                "Vendor end failed during finalization; continuing locally"
            );
        }

        let Some(mut record) = self.store.load(&entry.record_id).await? else {
            warn!(
                session_id = %session_id,
                record_id = %entry.record_id,
                "Registry entry had no persisted record"
            );
            return Ok(EndOutcome::Ended);
        };

        if record.status.is_terminal() {
            return Ok(EndOutcome::AlreadyEnded);
        }

        record.close(status, Utc::now());

        if let Err(first) = self.store.update(&record).await {
            warn!(
                session_id = %session_id,
                error = %first,
                "Terminal write failed, retrying once"
            );
            if let Err(second) = self.store.update(&record).await {
                error!(
                    session_id = %session_id,
                    record_id = %record.id,
                    error = %second,
                    "Terminal write failed twice; record left non-terminal"
                );
                return Err(second.into());
            }
        }

        info!(
            session_id = %session_id,
            record_id = %record.id,
            status = %status,
            duration_seconds = record.duration_seconds,
            "Session finalized"
        );
        Ok(EndOutcome::Ended)
    }

    // ------------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------------

    /// Read-only status query, polling-friendly: absence and ownership
    /// mismatches come back as sentinels, never errors. The vendor's own
    /// status is attached when the vendor answers, omitted when it does not.
    pub async fn get_status(&self, session_id: &str, user_id: &str) -> Result<SessionStatusView> {
        let Some(entry) = self.registry.get(session_id) else {
            return Ok(SessionStatusView::NotFound);
        };
        if entry.user_id != user_id {
            return Ok(SessionStatusView::Unauthorized);
        }
        let Some(record) = self.store.load(&entry.record_id).await? else {
            return Ok(SessionStatusView::NotFound);
        };

        let vendor_status = match self.gateway.session_status(session_id).await {
            Ok(status) => Some(status),
            Err(e) => {
                debug!(session_id = %session_id, error = %e, "Vendor status unavailable");
                None
            }
        };

        Ok(SessionStatusView::Found(SessionStatusReport {
            session_id: session_id.to_string(),
            status: record.status,
            kind: record.kind,
            started_at: record.started_at,
            interaction_count: record.interaction_count,
            vendor_status,
        }))
    }

    /// Authorize a stream attach and open the vendor channel for it.
    pub async fn attach_stream(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<(ActiveSession, VendorStream)> {
        let entry = self.lookup(session_id, user_id)?;
        let stream = self.gateway.open_stream_channel(session_id).await?;
        Ok((entry, stream))
    }

    /// Registry lookup plus ownership check, shared by the mutating
    /// operations and the stream attach path.
    pub fn lookup(&self, session_id: &str, user_id: &str) -> Result<ActiveSession> {
        let Some(entry) = self.registry.get(session_id) else {
            return Err(SessionError::NotFound(session_id.to_string()));
        };
        if entry.user_id != user_id {
            return Err(SessionError::Unauthorized(session_id.to_string()));
        }
        Ok(entry)
    }

    async fn load_record(&self, session_id: &str, record_id: &str) -> Result<LearningSession> {
        let Some(record) = self.store.load(record_id).await? else {
            return Err(SessionError::NotFound(session_id.to_string()));
        };
        Ok(record)
    }

    // ------------------------------------------------------------------------
    // Expiry
    // ------------------------------------------------------------------------

    /// Force-end sessions whose wall-clock age exceeds `max_age`.
    ///
    /// The safety net against vendor sessions orphaned by crashed clients;
    /// swept sessions are recorded as Abandoned rather than Completed.
    /// Returns the number of sessions ended.
    pub async fn cleanup_expired(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let stale = self.registry.started_before(cutoff);

        let mut ended = 0;
        for (session_id, entry) in stale {
            warn!(
                session_id = %session_id,
                user_id = %entry.user_id,
                age_hours = (Utc::now() - entry.started_at).num_hours(),
                "Force-ending expired session"
            );
            match self.finalize(&session_id, SessionStatus::Abandoned).await {
                Ok(EndOutcome::Ended) => ended += 1,
                Ok(EndOutcome::AlreadyEnded) => {}
                Err(e) => {
                    error!(session_id = %session_id, error = %e, "Failed to force-end session");
                }
            }
        }

        if ended > 0 {
            info!(ended = ended, "Expired session sweep complete");
        }
        ended
    }

    /// Spawn a background task that periodically force-ends expired
    /// sessions. The task runs until the runtime shuts down.
    pub fn spawn_expiry_sweeper(&self, interval: std::time::Duration, max_age: Duration) {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                manager.cleanup_expired(max_age).await;
            }
        });
    }
}
