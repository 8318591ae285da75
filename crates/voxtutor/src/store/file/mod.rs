//! File-based storage implementations.

mod review;
mod session;

pub use review::FileReviewStore;
pub use session::FileSessionStore;
