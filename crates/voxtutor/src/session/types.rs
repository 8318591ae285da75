//! Core session data model.
//!
//! A [`LearningSession`] is the persisted record of one voice session and
//! is owned exclusively by the lifecycle manager. [`VoiceInteraction`]s
//! are append-only log entries created by the stream relay. The
//! [`SessionConfig`] variants record exactly what was sent to the vendor
//! at creation time, typed per session kind with an `extras` passthrough
//! for vendor fields this backend never reads.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

use crate::learning::difficulty::{DifficultyLevel, Pace};

use super::profiles::ScenarioContext;

/// Prefix for persisted session record identifiers.
pub const SESSION_RECORD_PREFIX: &str = "lsn_";

/// Prefix for interaction log entry identifiers.
pub const INTERACTION_ID_PREFIX: &str = "int_";

// ============================================================================
// Enumerations
// ============================================================================

/// What kind of learning session this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Tutor,
    LanguagePractice,
    ExamPrep,
    Pronunciation,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tutor => "tutor",
            Self::LanguagePractice => "language_practice",
            Self::ExamPrep => "exam_prep",
            Self::Pronunciation => "pronunciation",
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a session.
///
/// Transitions are monotonic except for the active/paused pair; the two
/// terminal states absorb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Paused,
    Completed,
    Abandoned,
}

impl SessionStatus {
    /// Whether no further transitions may leave this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }

    /// Whether the state machine permits `self -> next`.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (Self::Active, Self::Paused)
                | (Self::Paused, Self::Active)
                | (Self::Active | Self::Paused, Self::Completed | Self::Abandoned)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Vendor Configuration
// ============================================================================

/// Configuration sent to the vendor when the remote session was created.
///
/// Tagged by session mode so the fields this backend reads are statically
/// checked; anything vendor-specific rides along in `extras` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SessionConfig {
    Tutor(TutorConfig),
    LanguagePractice(LanguagePracticeConfig),
    ExamPrep(ExamPrepConfig),
    Pronunciation(PronunciationConfig),
}

impl SessionConfig {
    pub fn kind(&self) -> SessionKind {
        match self {
            Self::Tutor(_) => SessionKind::Tutor,
            Self::LanguagePractice(_) => SessionKind::LanguagePractice,
            Self::ExamPrep(_) => SessionKind::ExamPrep,
            Self::Pronunciation(_) => SessionKind::Pronunciation,
        }
    }

    /// Subject label, where the kind has one.
    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::Tutor(c) => Some(&c.subject),
            Self::ExamPrep(c) => Some(&c.exam),
            Self::LanguagePractice(_) | Self::Pronunciation(_) => None,
        }
    }

    /// Language label, where the kind has one.
    pub fn language(&self) -> Option<&str> {
        match self {
            Self::Tutor(c) => Some(&c.language),
            Self::LanguagePractice(c) => Some(&c.target_language),
            Self::Pronunciation(c) => Some(&c.language),
            Self::ExamPrep(_) => None,
        }
    }

    /// Difficulty label, where the kind has one.
    pub fn difficulty(&self) -> Option<DifficultyLevel> {
        match self {
            Self::Tutor(c) => Some(c.difficulty),
            Self::LanguagePractice(c) => Some(c.proficiency),
            Self::ExamPrep(c) => Some(c.difficulty),
            Self::Pronunciation(_) => None,
        }
    }
}

/// Vendor configuration for an AI tutor session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorConfig {
    pub subject: String,
    pub difficulty: DifficultyLevel,
    pub learning_style: String,
    /// Tutor persona resolved from subject and learning style.
    pub personality: TutorPersonality,
    pub voice_id: String,
    pub language: String,
    pub pace: Pace,
    pub features: Vec<String>,
    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, Value>,
}

/// How the tutor voice should come across. All labels the vendor prompt
/// templates consume; this backend never branches on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorPersonality {
    pub tone: String,
    pub pace: String,
    pub examples: String,
    pub encouragement: String,
}

/// Vendor configuration for a conversational language-practice session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguagePracticeConfig {
    pub target_language: String,
    pub native_language: String,
    pub scenario: String,
    pub proficiency: DifficultyLevel,
    pub correction_style: String,
    pub voice_id: String,
    pub features: Vec<String>,
    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, Value>,
}

/// Vendor configuration for an exam-preparation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamPrepConfig {
    pub exam: String,
    pub topics: Vec<String>,
    pub question_count: u32,
    pub difficulty: DifficultyLevel,
    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, Value>,
}

/// Vendor configuration for a pronunciation-analysis session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PronunciationConfig {
    pub language: String,
    pub focus_areas: Vec<String>,
    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, Value>,
}

// ============================================================================
// Learning Session Record
// ============================================================================

/// Persisted record of one voice learning session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningSession {
    /// Opaque record identifier (`lsn_` + ULID).
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Vendor-assigned remote session identifier.
    pub vendor_session_id: String,
    pub kind: SessionKind,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<DifficultyLevel>,
    pub started_at: DateTime<Utc>,
    /// Set exactly once, on the terminal transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// `ended_at - started_at`, derived at the terminal transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
    /// Monotonic count of persisted interactions.
    #[serde(default)]
    pub interaction_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_emotion_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronunciation_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comprehension_score: Option<f64>,
    /// What was sent to the vendor at creation time.
    pub config: SessionConfig,
}

impl LearningSession {
    /// Start a new active session record for a freshly created vendor session.
    pub fn new(
        user_id: impl Into<String>,
        vendor_session_id: impl Into<String>,
        config: SessionConfig,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("{}{}", SESSION_RECORD_PREFIX, Ulid::new()),
            user_id: user_id.into(),
            vendor_session_id: vendor_session_id.into(),
            kind: config.kind(),
            status: SessionStatus::Active,
            subject: config.subject().map(str::to_string),
            language: config.language().map(str::to_string),
            difficulty: config.difficulty(),
            started_at,
            ended_at: None,
            duration_seconds: None,
            interaction_count: 0,
            average_emotion_score: None,
            pronunciation_score: None,
            comprehension_score: None,
            config,
        }
    }

    /// Apply the terminal transition.
    ///
    /// Sets `ended_at` and derives `duration_seconds`. Callers must have
    /// checked that the record is not already terminal.
    pub fn close(&mut self, status: SessionStatus, at: DateTime<Utc>) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.ended_at = Some(at);
        self.duration_seconds = Some((at - self.started_at).num_seconds().max(0));
    }
}

// ============================================================================
// Voice Interactions
// ============================================================================

/// What one logged interaction represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    UserSpeech,
    AiResponse,
    PronunciationFeedback,
    EmotionDetection,
    LearningInsight,
}

/// One immutable, append-only interaction log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceInteraction {
    /// Opaque entry identifier (`int_` + ULID).
    pub id: String,
    /// Record id of the owning [`LearningSession`].
    pub session_id: String,
    pub user_id: String,
    pub kind: InteractionKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronunciation_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fluency_score: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl VoiceInteraction {
    fn base(session_id: &str, user_id: &str, kind: InteractionKind) -> Self {
        Self {
            id: format!("{}{}", INTERACTION_ID_PREFIX, Ulid::new()),
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            kind,
            timestamp: Utc::now(),
            transcript: None,
            emotion: None,
            emotion_confidence: None,
            pronunciation_score: None,
            fluency_score: None,
            metadata: BTreeMap::new(),
        }
    }

    /// A speech-turn transcript entry, attributed to the stated speaker.
    pub fn speech(session_id: &str, user_id: &str, kind: InteractionKind, text: &str) -> Self {
        Self {
            transcript: Some(text.to_string()),
            ..Self::base(session_id, user_id, kind)
        }
    }

    /// A pronunciation score entry, with optional feedback text.
    pub fn pronunciation(
        session_id: &str,
        user_id: &str,
        score: f64,
        feedback: Option<&str>,
    ) -> Self {
        Self {
            pronunciation_score: Some(score),
            transcript: feedback.map(str::to_string),
            ..Self::base(session_id, user_id, InteractionKind::PronunciationFeedback)
        }
    }
}

// ============================================================================
// Handles & Views
// ============================================================================

/// What a successful session creation hands back to the caller: the ids,
/// where to attach the stream, and the configuration the vendor received.
#[derive(Debug, Clone, Serialize)]
pub struct SessionHandle {
    /// Vendor session id; the id clients use for all session operations.
    pub session_id: String,
    /// Persisted record id.
    pub record_id: String,
    /// Path of the duplex stream endpoint for this session.
    pub stream_endpoint: String,
    pub status: SessionStatus,
    pub config: SessionConfig,
    /// Scenario briefing for language practice; absent for other kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario_context: Option<ScenarioContext>,
}

/// Read-only status answer. A polling-friendly query: absence and
/// ownership mismatches are values here, never errors.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SessionStatusView {
    NotFound,
    Unauthorized,
    Found(SessionStatusReport),
}

/// Status of one live (or recently live) session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatusReport {
    pub session_id: String,
    pub status: SessionStatus,
    pub kind: SessionKind,
    pub started_at: DateTime<Utc>,
    pub interaction_count: u64,
    /// The vendor's own view of the remote session, passed through opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_status: Option<Value>,
}

/// Outcome of an end-session call. Ending an absent or already-completed
/// session reports `AlreadyEnded` instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndOutcome {
    Ended,
    AlreadyEnded,
}
