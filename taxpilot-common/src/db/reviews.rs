//! SQLite review store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::warn;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::ReviewStore;
use crate::types::{ReviewItem, ReviewStatus};

/// Review queue backed by the shared SQLite database.
#[derive(Clone)]
pub struct SqliteReviewStore {
    pool: SqlitePool,
}

impl SqliteReviewStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn item_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ReviewItem> {
    let id: String = row.get("id");
    let status: String = row.get("status");
    let resolved_at: Option<String> = row.get("resolved_at");
    let created_at: String = row.get("created_at");

    Ok(ReviewItem {
        id: Uuid::parse_str(&id)
            .map_err(|e| Error::Internal(format!("corrupt review id {id}: {e}")))?,
        session_id: row.get("session_id"),
        field_name: row.get("field_name"),
        field_value: row.get("field_value"),
        reason: row.get("reason"),
        confidence: row.get("confidence"),
        status: status.parse()?,
        reviewer_notes: row.get("reviewer_notes"),
        resolved_at: resolved_at
            .map(|s| parse_timestamp(&s))
            .transpose()?,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("corrupt timestamp {s}: {e}")))
}

#[async_trait]
impl ReviewStore for SqliteReviewStore {
    async fn insert(&self, item: &ReviewItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO review_items
                (id, session_id, field_name, field_value, reason, confidence,
                 status, reviewer_notes, resolved_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.id.to_string())
        .bind(&item.session_id)
        .bind(&item.field_name)
        .bind(&item.field_value)
        .bind(&item.reason)
        .bind(item.confidence)
        .bind(item.status.as_str())
        .bind(&item.reviewer_notes)
        .bind(item.resolved_at.map(|t| t.to_rfc3339()))
        .bind(item.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<ReviewItem>> {
        let rows = sqlx::query("SELECT * FROM review_items ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(item_from_row).collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<ReviewItem>> {
        let row = sqlx::query("SELECT * FROM review_items WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(item_from_row).transpose()
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

        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("review item {id}")))?;

        if existing.status.is_terminal() {
            warn!(%id, old_status = %existing.status, new_status = %status,
                "overwriting resolution of already-terminal review item");
        }

        sqlx::query(
            r#"
            UPDATE review_items
            SET status = ?, reviewer_notes = ?, resolved_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(&notes)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("review item {id}")))
    }
}
