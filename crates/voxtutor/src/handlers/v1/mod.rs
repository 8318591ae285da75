//! V1 API handlers.

mod reviews;
mod sessions;
mod speech;
mod stream;

pub use reviews::{due_reviews, submit_review};
pub use sessions::{create_session, end_session, get_session, pause_session, resume_session};
pub use speech::{analyze_pronunciation, common_mistakes, pronunciation_guide};
pub use stream::stream_session;
