//! Session and review store abstractions
//!
//! The services depend on these traits rather than any concrete storage so
//! the conversational core is testable without a database. In-memory
//! implementations live here; SQLite-backed ones in `db`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{ReviewItem, ReviewStatus, SessionState};

/// Persistence seam for conversation sessions. Sessions are loaded and
/// saved wholesale; the caller serializes transitions per session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>>;
    async fn save(&self, session: &SessionState) -> Result<()>;
}

/// Persistence seam for the review queue. Reads observe a consistent
/// snapshot; no item is ever observable half-written.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert(&self, item: &ReviewItem) -> Result<()>;
    async fn list(&self) -> Result<Vec<ReviewItem>>;
    async fn get(&self, id: Uuid) -> Result<Option<ReviewItem>>;

    /// Apply a reviewer disposition. Fails with `NotFound` for an unknown
    /// id and `InvalidInput` when `status` is not terminal. Re-resolving an
    /// already-terminal item overwrites status/notes/resolved_at.
    async fn resolve(
        &self,
        id: Uuid,
        status: ReviewStatus,
        notes: Option<String>,
    ) -> Result<ReviewItem>;
}

// ============================================================================
// In-memory implementations
// ============================================================================

/// Process-local session store.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn save(&self, session: &SessionState) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    }
}

/// Process-local review queue.
#[derive(Default)]
pub struct MemoryReviewStore {
    items: RwLock<HashMap<Uuid, ReviewItem>>,
}

impl MemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn insert(&self, item: &ReviewItem) -> Result<()> {
        self.items.write().await.insert(item.id, item.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ReviewItem>> {
        let items = self.items.read().await;
        let mut all: Vec<ReviewItem> = items.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ReviewItem>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn resolve(
        &self,
        id: Uuid,
        status: ReviewStatus,
        notes: Option<String>,
    ) -> Result<ReviewItem> {
        if !status.is_terminal() {
            return Err(Error::InvalidInput(format!(
                "resolution status must be terminal, got {status}"
            )));
        }

        let mut items = self.items.write().await;
        let item = items
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("review item {id}")))?;

        if item.status.is_terminal() {
            warn!(%id, old_status = %item.status, new_status = %status,
                "overwriting resolution of already-terminal review item");
        }

        item.status = status;
        item.reviewer_notes = notes;
        item.resolved_at = Some(Utc::now());
        Ok(item.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
