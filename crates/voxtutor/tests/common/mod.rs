//! Common test utilities.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use serde_json::{Value, json};

use voxtutor::learning::ReviewService;
use voxtutor::server::{self, AppState, RuntimeServices};
use voxtutor::session::{SessionConfig, SessionManager};
use voxtutor::speech::SpeechAnalyzer;
use voxtutor::store::{FileReviewStore, FileSessionStore};
use voxtutor::vendor::{VendorError, VendorGateway, VendorStream};

/// Vendor stand-in: hands out sequential session ids and answers every
/// call successfully without any network.
#[derive(Default)]
pub struct StubGateway {
    next_id: AtomicU64,
}

#[async_trait]
impl VendorGateway for StubGateway {
    async fn create_voice_session(&self, _config: &SessionConfig) -> Result<String, VendorError> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(format!("vnd-{n}"))
    }

    async fn end_voice_session(&self, _remote_session_id: &str) -> Result<(), VendorError> {
        Ok(())
    }

    async fn pause_voice_session(&self, _remote_session_id: &str) -> Result<(), VendorError> {
        Ok(())
    }

    async fn resume_voice_session(&self, _remote_session_id: &str) -> Result<(), VendorError> {
        Ok(())
    }

    async fn session_status(&self, remote_session_id: &str) -> Result<Value, VendorError> {
        Ok(json!({ "session_id": remote_session_id, "state": "running" }))
    }

    async fn analyze_speech(
        &self,
        _audio: Bytes,
        _analysis_type: &str,
    ) -> Result<Value, VendorError> {
        Ok(json!({
            "overall_score": 0.9,
            "phoneme_scores": [],
            "fluency_score": 0.85,
        }))
    }

    async fn open_stream_channel(
        &self,
        _remote_session_id: &str,
    ) -> Result<VendorStream, VendorError> {
        // Dangling pair: the far ends drop immediately, so any relay sees
        // a closed vendor stream.
        let (stream, _incoming, _outgoing) = VendorStream::pair();
        Ok(stream)
    }
}

/// Create a test `AppState` backed by file stores in a temp directory.
pub fn test_app_state() -> AppState {
    use tempfile::TempDir;

    let tmp = TempDir::new().unwrap();

    // Leak the TempDir so it doesn't get cleaned up during the test.
    let tmp = Box::leak(Box::new(tmp));

    let gateway: Arc<dyn VendorGateway> = Arc::new(StubGateway::default());
    let session_store = Arc::new(FileSessionStore::new(tmp.path().join("sessions")));
    let review_store = Arc::new(FileReviewStore::new(tmp.path().join("reviews")));

    AppState {
        services: RuntimeServices {
            sessions: SessionManager::new(gateway.clone(), session_store),
            reviews: ReviewService::new(review_store),
            speech: SpeechAnalyzer::new(gateway),
        },
        max_connections: 64,
    }
}

/// Create a test app with empty state.
pub fn test_app() -> Router {
    server::build_app(test_app_state(), 30)
}
