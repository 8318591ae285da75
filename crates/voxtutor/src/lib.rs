//! Voxtutor - a voice-first learning session backend for tutoring, language
//! practice, exam prep, and pronunciation coaching.

// ============================================================================
// Core Infrastructure
// ============================================================================

pub mod config;
pub mod store;

// ============================================================================
// Server & HTTP
// ============================================================================

pub mod api;
pub mod handlers;
pub mod server;

// ============================================================================
// Domain
// ============================================================================

pub mod learning;
pub mod session;
pub mod speech;
pub mod vendor;
