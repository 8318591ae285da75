//! Duplex stream relay between a connected client and the vendor channel.
//!
//! One relay serves one session. Both inbound sources, the client socket
//! and the vendor channel, feed a single sequential loop so events within
//! a session are never reordered. Vendor transcript and pronunciation
//! events are persisted as [`VoiceInteraction`]s on the way through;
//! persistence failures are logged and the message is forwarded anyway.
//! When either side disconnects the relay finalizes the session.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use crate::store::StorageError;
use crate::vendor::{VendorFrame, VendorStream};

use super::manager::SessionManager;
use super::types::{EndOutcome, InteractionKind, SessionStatus, VoiceInteraction};

/// What to do with one client text frame.
#[derive(Debug, PartialEq)]
enum ClientAction {
    /// Pass the frame to the vendor channel as-is.
    ForwardToVendor(String),
    /// Answer the client directly without involving the vendor.
    Reply(String),
    /// Ignore the frame.
    Drop,
}

/// Relay for one attached client stream.
pub struct StreamRelay {
    manager: SessionManager,
    session_id: String,
    record_id: String,
    user_id: String,
}

impl StreamRelay {
    pub fn new(manager: SessionManager, session_id: &str, record_id: &str, user_id: &str) -> Self {
        Self {
            manager,
            session_id: session_id.to_string(),
            record_id: record_id.to_string(),
            user_id: user_id.to_string(),
        }
    }

    /// Run the relay until either side disconnects, then finalize the
    /// session. Finalization races with explicit ends and the expiry
    /// sweeper; the manager guarantees at-most-once per session id.
    pub async fn run(self, client: WebSocket, vendor: VendorStream) {
        info!(
            session_id = %self.session_id,
            user_id = %self.user_id,
            "Stream attached"
        );

        self.relay_loop(client, vendor).await;

        match self
            .manager
            .finalize(&self.session_id, SessionStatus::Completed)
            .await
        {
            Ok(EndOutcome::Ended) => {
                info!(session_id = %self.session_id, "Stream closed, session finalized");
            }
            Ok(EndOutcome::AlreadyEnded) => {
                debug!(session_id = %self.session_id, "Stream closed after session end");
            }
            Err(e) => {
                error!(
                    session_id = %self.session_id,
                    error = %e,
                    "Finalization after stream close failed"
                );
            }
        }
    }

    async fn relay_loop(&self, client: WebSocket, mut vendor: VendorStream) {
        let (mut to_client, mut from_client) = client.split();

        loop {
            tokio::select! {
                frame = vendor.from_vendor.recv() => {
                    let Some(frame) = frame else {
                        debug!(session_id = %self.session_id, "Vendor channel closed");
                        break;
                    };
                    let message = self.client_bound(frame).await;
                    if to_client.send(message).await.is_err() {
                        debug!(session_id = %self.session_id, "Client gone while forwarding");
                        break;
                    }
                }
                message = from_client.next() => {
                    match message {
                        Some(Ok(Message::Binary(audio))) => {
                            if vendor.to_vendor.send(VendorFrame::Audio(audio)).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Text(text))) => {
                            match Self::classify_client_text(text.as_str()) {
                                ClientAction::ForwardToVendor(raw) => {
                                    if vendor.to_vendor.send(VendorFrame::Event(raw)).await.is_err() {
                                        break;
                                    }
                                }
                                ClientAction::Reply(json) => {
                                    if to_client.send(Message::Text(json.into())).await.is_err() {
                                        break;
                                    }
                                }
                                ClientAction::Drop => {}
                            }
                        }
                        Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                        Some(Ok(Message::Close(_))) => {
                            info!(session_id = %self.session_id, "Client closed stream");
                            break;
                        }
                        Some(Err(e)) => {
                            debug!(session_id = %self.session_id, error = %e, "Client socket error");
                            break;
                        }
                        None => {
                            info!(session_id = %self.session_id, "Client disconnected");
                            break;
                        }
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Vendor -> Client
    // ------------------------------------------------------------------------

    /// Translate one vendor frame into its client-bound message, persisting
    /// transcript and pronunciation events as a side effect. Every frame is
    /// forwarded whether or not persistence applies or succeeds.
    async fn client_bound(&self, frame: VendorFrame) -> Message {
        match frame {
            VendorFrame::Audio(audio) => Message::Binary(audio),
            VendorFrame::Event(raw) => {
                self.persist_vendor_event(&raw).await;
                Message::Text(raw.into())
            }
        }
    }

    /// Persist the interaction a vendor event implies, if any. Events with
    /// an unknown tag, missing fields, or a body that does not parse carry
    /// nothing to persist.
    async fn persist_vendor_event(&self, raw: &str) {
        let Ok(event) = serde_json::from_str::<Value>(raw) else {
            return;
        };

        let interaction = match event["type"].as_str() {
            Some("transcript") => {
                let Some(text) = event["text"].as_str() else {
                    return;
                };
                let kind = if event["speaker"].as_str() == Some("user") {
                    InteractionKind::UserSpeech
                } else {
                    InteractionKind::AiResponse
                };
                VoiceInteraction::speech(&self.record_id, &self.user_id, kind, text)
            }
            Some("pronunciation") => {
                let Some(score) = event["score"].as_f64() else {
                    return;
                };
                VoiceInteraction::pronunciation(
                    &self.record_id,
                    &self.user_id,
                    score,
                    event["feedback"].as_str(),
                )
            }
            _ => return,
        };

        self.log_interaction(interaction).await;
    }

    /// Append the interaction and bump the session's counter. Failures are
    /// logged and swallowed; the relay loop must outlive storage hiccups.
    async fn log_interaction(&self, interaction: VoiceInteraction) {
        let store = self.manager.store();

        if let Err(e) = store.append_interaction(&interaction).await {
            error!(
                session_id = %self.session_id,
                error = %e,
                "Failed to persist interaction"
            );
            return;
        }

        match store.load(&self.record_id).await {
            Ok(Some(mut record)) => {
                if record.status.is_terminal() {
                    // Finalization won the race; the log entry stands but
                    // the counter on a terminal record stays frozen.
                    debug!(session_id = %self.session_id, "Session ended, counter left frozen");
                    return;
                }
                record.interaction_count += 1;
                match store.update(&record).await {
                    Ok(()) => {}
                    Err(StorageError::TerminalOverwrite { .. }) => {
                        debug!(
                            session_id = %self.session_id,
                            "Session finalized mid-update, counter left frozen"
                        );
                    }
                    Err(e) => {
                        error!(
                            session_id = %self.session_id,
                            error = %e,
                            "Failed to update interaction count"
                        );
                    }
                }
            }
            Ok(None) => {
                warn!(
                    session_id = %self.session_id,
                    record_id = %self.record_id,
                    "Interaction logged for a missing session record"
                );
            }
            Err(e) => {
                error!(session_id = %self.session_id, error = %e, "Failed to load session record");
            }
        }
    }

    // ------------------------------------------------------------------------
    // Client -> Vendor
    // ------------------------------------------------------------------------

    /// Classify one client text frame.
    ///
    /// `command` frames are acknowledged directly and do not touch the
    /// vendor or the lifecycle; pausing the underlying session is a
    /// session-level HTTP operation, not a stream operation. `text` frames
    /// go to the vendor verbatim. Anything else, including frames that do
    /// not parse, is dropped.
    fn classify_client_text(raw: &str) -> ClientAction {
        let Ok(message) = serde_json::from_str::<Value>(raw) else {
            warn!("Dropping malformed client frame");
            return ClientAction::Drop;
        };

        match message["type"].as_str() {
            Some("command") => match message["command"].as_str() {
                // handled: false, so the ack cannot be read as a transition
                Some(command @ ("pause" | "resume")) => ClientAction::Reply(
                    json!({ "type": "ack", "command": command, "handled": false }).to_string(),
                ),
                _ => ClientAction::Drop,
            },
            Some("text") => ClientAction::ForwardToVendor(raw.to_string()),
            _ => ClientAction::Drop,
        }
    }
}
