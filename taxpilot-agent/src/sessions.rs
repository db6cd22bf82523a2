//! Session management
//!
//! Owns the load → classify → transition → gate → save pipeline for each
//! inbound utterance. Sessions for different ids never contend; requests
//! for the same id serialize behind a per-key mutex so no transition ever
//! observes a partially updated session.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use taxpilot_common::api::{ChatResponse, ExtractedFields, StageInfo};
use taxpilot_common::store::{ReviewStore, SessionStore};
use taxpilot_common::types::SessionState;
use taxpilot_common::Result;

use crate::engine::{self, TransitionOutcome};
use crate::intent;

/// Coordinates session persistence and per-session serialization.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    reviews: Arc<dyn ReviewStore>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, reviews: Arc<dyn ReviewStore>) -> Self {
        Self {
            store,
            reviews,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The per-session lock, created on first use.
    async fn lock_for(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Handle one chat utterance: at most one transition in flight per
    /// session id.
    pub async fn handle_message(&self, session_id: &str, message: &str) -> Result<ChatResponse> {
        let lock = self.lock_for(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self
            .store
            .load(session_id)
            .await?
            .unwrap_or_else(|| SessionState::new(session_id));

        let intent = intent::classify(session.stage, message);
        debug!(session_id, stage = %session.stage, ?intent, "classified utterance");

        let outcome = engine::apply(&mut session, &intent);
        self.finish_transition(&mut session, outcome).await
    }

    /// Feed document-extracted fields through the income declaration
    /// transition (the upload entry point).
    pub async fn ingest_document(
        &self,
        session_id: &str,
        fields: &ExtractedFields,
    ) -> Result<ChatResponse> {
        let lock = self.lock_for(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self
            .store
            .load(session_id)
            .await?
            .unwrap_or_else(|| SessionState::new(session_id));

        let outcome = engine::apply_extracted_income(&mut session, fields);
        self.finish_transition(&mut session, outcome).await
    }

    /// Persist new review items and the updated session, then shape the
    /// response payload.
    async fn finish_transition(
        &self,
        session: &mut SessionState,
        outcome: TransitionOutcome,
    ) -> Result<ChatResponse> {
        for item in &outcome.review_candidates {
            self.reviews.insert(item).await?;
            info!(session_id = %session.session_id, field = %item.field_name,
                confidence = item.confidence, "review item flagged");
        }

        session.updated_at = Utc::now();
        self.store.save(session).await?;

        Ok(ChatResponse {
            message: outcome.reply,
            cards: outcome.cards,
            stage_info: StageInfo {
                current_stage: session.stage,
                confidence: session.confidence,
                needs_review: session.needs_review,
            },
        })
    }

    /// Read-only snapshot of a session.
    pub async fn snapshot(&self, session_id: &str) -> Result<Option<SessionState>> {
        self.store.load(session_id).await
    }
}
