//! Persistence for session records, interaction logs, and review schedules.
//!
//! Storage is trait-based so backends can vary per deployment. The file
//! backend keeps one directory per session (YAML record plus an append-only
//! JSONL interaction log) and one YAML document per user for reviews.

mod error;
pub mod file;
mod review;
mod session;
#[cfg(test)]
pub mod testing;

pub use error::{StorageError, StorageResult};
pub use file::{FileReviewStore, FileSessionStore};
pub use review::ReviewStore;
pub use session::SessionStore;
