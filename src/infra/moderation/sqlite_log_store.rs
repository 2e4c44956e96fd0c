// SQLite-backed moderation log.
//
// Tables:
// - moderation_events: one row per blocked submission. Categories and
//   flagged fragments are stored as JSON arrays.

use crate::core::moderation::{
    Category, ContentSurface, LogStoreError, ModerationEvent, ModerationLogStore, Severity,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteModerationLog {
    pool: Pool<Sqlite>,
}

impl SqliteModerationLog {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), LogStoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS moderation_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT,
                surface TEXT NOT NULL,
                categories TEXT NOT NULL,
                flagged_content TEXT NOT NULL,
                severity TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_moderation_events_user
                ON moderation_events(user_id, created_at);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| LogStoreError::StorageError(e.to_string()))?;

        Ok(())
    }
}

fn storage_err(e: impl std::fmt::Display) -> LogStoreError {
    LogStoreError::StorageError(e.to_string())
}

fn event_from_row(row: &SqliteRow) -> Result<ModerationEvent, LogStoreError> {
    let surface: String = row.get("surface");
    let severity: String = row.get("severity");
    let categories: String = row.get("categories");
    let flagged_content: String = row.get("flagged_content");
    let created_at: String = row.get("created_at");

    Ok(ModerationEvent {
        user_id: row.get("user_id"),
        surface: ContentSurface::parse(&surface)
            .ok_or_else(|| storage_err(format!("unknown surface `{surface}`")))?,
        categories: serde_json::from_str::<Vec<Category>>(&categories).map_err(storage_err)?,
        flagged_content: serde_json::from_str(&flagged_content).map_err(storage_err)?,
        severity: Severity::parse(&severity)
            .ok_or_else(|| storage_err(format!("unknown severity `{severity}`")))?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(storage_err)?
            .with_timezone(&Utc),
    })
}

#[async_trait]
impl ModerationLogStore for SqliteModerationLog {
    async fn record_event(&self, event: ModerationEvent) -> Result<(), LogStoreError> {
        let categories = serde_json::to_string(&event.categories).map_err(storage_err)?;
        let flagged_content = serde_json::to_string(&event.flagged_content).map_err(storage_err)?;

        sqlx::query(
            r#"
            INSERT INTO moderation_events
                (user_id, surface, categories, flagged_content, severity, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.user_id)
        .bind(event.surface.as_str())
        .bind(categories)
        .bind(flagged_content)
        .bind(event.severity.as_str())
        .bind(event.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    async fn recent_events(&self, limit: usize) -> Result<Vec<ModerationEvent>, LogStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, surface, categories, flagged_content, severity, created_at
            FROM moderation_events
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.iter().map(event_from_row).collect()
    }
}
