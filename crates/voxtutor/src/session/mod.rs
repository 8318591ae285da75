//! Voice learning-session lifecycle.
//!
//! # Architecture
//!
//! ```text
//!  ┌────────────────┐  create/pause/resume/end  ┌───────────────┐
//!  │ SessionManager │──────────────────────────▶│ VendorGateway │
//!  │ (state machine)│                           └───────▲───────┘
//!  └───┬────────┬───┘                                   │ duplex channel
//!      │        │ registers                             │
//!      │        ▼                                       │
//!      │  ┌────────────────┐      lookup        ┌───────┴─────┐
//!      │  │ ActiveSessions │◀───────────────────│ StreamRelay │
//!      │  │ (id → entry)   │                    └──────┬──────┘
//!      │  └────────────────┘                           │ logs interactions
//!      ▼                                               ▼
//!            persisted records + logs (SessionStore)
//! ```
//!
//! - **SessionManager** — owns every persisted state change; coordinates the
//!   remote vendor session, the persisted record, and the live registry.
//! - **ActiveSessions** — in-memory index of sessions in their Active/Paused
//!   window; its atomic removal is the at-most-once finalization gate.
//! - **StreamRelay** — one per attached client; forwards frames both ways
//!   and persists transcript/pronunciation events as interactions.

mod error;
mod manager;
mod profiles;
mod registry;
mod relay;
mod types;

pub use error::SessionError;
pub use manager::{CreateSessionContext, SessionManager};
pub use profiles::ScenarioContext;
pub use registry::{ActiveSession, ActiveSessions};
pub use relay::StreamRelay;
pub use types::{
    EndOutcome, ExamPrepConfig, InteractionKind, LanguagePracticeConfig, LearningSession,
    PronunciationConfig, SessionConfig, SessionHandle, SessionKind, SessionStatus,
    SessionStatusReport, SessionStatusView, TutorConfig, TutorPersonality, VoiceInteraction,
};
