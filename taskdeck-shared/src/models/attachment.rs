/// Attachment model
///
/// Only metadata lives in the database; the bytes are in the object store
/// at `file_url`. Deleting the row hands back the URL so the caller can
/// remove the blob too.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attachment {
    pub id: i64,
    pub task_id: i64,

    /// Original file name as uploaded
    pub filename: String,

    /// Public object-store URL
    pub file_url: String,

    /// MIME type reported by the client
    pub file_type: Option<String>,

    /// Size in bytes
    pub size: Option<i64>,

    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub task_id: i64,
    pub filename: String,
    pub file_url: String,
    pub file_type: Option<String>,
    pub size: Option<i64>,
}

impl Attachment {
    pub async fn create(pool: &PgPool, data: NewAttachment) -> Result<Self, sqlx::Error> {
        let attachment = sqlx::query_as::<_, Attachment>(
            r#"
            INSERT INTO attachments (task_id, filename, file_url, file_type, size)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, task_id, filename, file_url, file_type, size, uploaded_at
            "#,
        )
        .bind(data.task_id)
        .bind(data.filename)
        .bind(data.file_url)
        .bind(data.file_type)
        .bind(data.size)
        .fetch_one(pool)
        .await?;

        tracing::info!(
            attachment_id = attachment.id,
            task_id = attachment.task_id,
            size = attachment.size,
            "Attachment recorded"
        );
        Ok(attachment)
    }

    /// Attachments of a task, newest first
    pub async fn list_for_task(pool: &PgPool, task_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Attachment>(
            r#"
            SELECT id, task_id, filename, file_url, file_type, size, uploaded_at
            FROM attachments
            WHERE task_id = $1
            ORDER BY uploaded_at DESC, id DESC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    /// Deletes an attachment the user owns, returning the removed row
    pub async fn delete_owned(
        pool: &PgPool,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let attachment = sqlx::query_as::<_, Attachment>(
            r#"
            DELETE FROM attachments a
            USING tasks t, boards b, projects p
            WHERE a.id = $1
              AND t.id = a.task_id
              AND b.id = t.board_id
              AND p.id = b.project_id
              AND p.user_id = $2
            RETURNING a.id, a.task_id, a.filename, a.file_url, a.file_type, a.size, a.uploaded_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        if attachment.is_some() {
            tracing::info!(attachment_id = id, user_id, "Attachment deleted");
        }
        Ok(attachment)
    }
}
