//! Learning algorithms: spaced repetition and adaptive difficulty.

pub mod difficulty;
pub mod reviews;
pub mod spaced_repetition;

pub use difficulty::{AdaptivePlan, DifficultyLevel, Pace};
pub use reviews::{ReviewError, ReviewItem, ReviewService};
pub use spaced_repetition::{InvalidQuality, NextReview, compute_next_review};
