/// Comment model
///
/// Comments are listed oldest first with a summary of their author. Only
/// the author may edit or delete a comment; for anyone else the comment
/// does not exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

use super::user::UserSummary;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub task_id: i64,

    /// Author
    pub user_id: i64,

    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment with its author embedded under `user`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: UserSummary,
}

/// Request body for creating or editing a comment
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommentBody {
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: String,
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    #[sqlx(flatten)]
    comment: Comment,
    username: String,
    email: String,
    avatar_url: Option<String>,
}

impl From<CommentRow> for CommentWithAuthor {
    fn from(row: CommentRow) -> Self {
        Self {
            user: UserSummary {
                id: row.comment.user_id,
                username: row.username,
                email: row.email,
                avatar_url: row.avatar_url,
            },
            comment: row.comment,
        }
    }
}

impl Comment {
    /// Adds a comment to a task and returns it with its author
    pub async fn create(
        pool: &PgPool,
        task_id: i64,
        user_id: i64,
        content: &str,
    ) -> Result<CommentWithAuthor, sqlx::Error> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            WITH c AS (
                INSERT INTO comments (task_id, user_id, content)
                VALUES ($1, $2, $3)
                RETURNING id, task_id, user_id, content, created_at, updated_at
            )
            SELECT c.id, c.task_id, c.user_id, c.content, c.created_at, c.updated_at,
                   u.username, u.email, u.avatar_url
            FROM c
            JOIN users u ON u.id = c.user_id
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(pool)
        .await?;

        tracing::info!(comment_id = row.comment.id, task_id, user_id, "Comment created");
        Ok(row.into())
    }

    /// Comments on a task, oldest first
    pub async fn list_for_task(
        pool: &PgPool,
        task_id: i64,
    ) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.task_id, c.user_id, c.content, c.created_at, c.updated_at,
                   u.username, u.email, u.avatar_url
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.task_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Replaces the content of a comment written by `user_id`
    pub async fn update_authored(
        pool: &PgPool,
        id: i64,
        user_id: i64,
        content: &str,
    ) -> Result<Option<CommentWithAuthor>, sqlx::Error> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            WITH c AS (
                UPDATE comments
                SET content = $3, updated_at = NOW()
                WHERE id = $1 AND user_id = $2
                RETURNING id, task_id, user_id, content, created_at, updated_at
            )
            SELECT c.id, c.task_id, c.user_id, c.content, c.created_at, c.updated_at,
                   u.username, u.email, u.avatar_url
            FROM c
            JOIN users u ON u.id = c.user_id
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(content)
        .fetch_optional(pool)
        .await?;

        if row.is_some() {
            tracing::info!(comment_id = id, user_id, "Comment updated");
        }
        Ok(row.map(Into::into))
    }

    /// Deletes a comment written by `user_id`
    pub async fn delete_authored(
        pool: &PgPool,
        id: i64,
        user_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!(comment_id = id, user_id, "Comment deleted");
        }
        Ok(deleted)
    }
}
