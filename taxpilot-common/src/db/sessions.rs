//! SQLite session store

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{Error, Result};
use crate::store::SessionStore;
use crate::types::SessionState;

/// Session store backed by the shared SQLite database.
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT payload FROM sessions WHERE id = ?")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((payload,)) => {
                let session = serde_json::from_str(&payload).map_err(|e| {
                    Error::Internal(format!("corrupt session payload for {session_id}: {e}"))
                })?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, session: &SessionState) -> Result<()> {
        let payload = serde_json::to_string(session)
            .map_err(|e| Error::Internal(format!("serialize session: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO sessions (id, payload, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&session.session_id)
        .bind(&payload)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
