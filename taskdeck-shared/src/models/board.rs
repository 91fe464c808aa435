/// Board model
///
/// Boards are ordered columns inside a project. Callers must pass the
/// project through the ownership gate before creating or listing boards;
/// update and delete carry the ownership join themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Board {
    pub id: i64,
    pub project_id: i64,
    pub name: String,

    /// Sort key within the project, ascending
    pub position: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBoard {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Defaults to 0
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBoard {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    pub position: Option<i32>,
}

impl Board {
    pub async fn create(
        pool: &PgPool,
        project_id: i64,
        data: CreateBoard,
    ) -> Result<Self, sqlx::Error> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            INSERT INTO boards (project_id, name, position)
            VALUES ($1, $2, $3)
            RETURNING id, project_id, name, position, created_at, updated_at
            "#,
        )
        .bind(project_id)
        .bind(data.name)
        .bind(data.position.unwrap_or(0))
        .fetch_one(pool)
        .await?;

        tracing::info!(board_id = board.id, project_id, "Board created");
        Ok(board)
    }

    /// Boards of a project by position
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Board>(
            r#"
            SELECT id, project_id, name, position, created_at, updated_at
            FROM boards
            WHERE project_id = $1
            ORDER BY position ASC, id ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Partial update of a board the user owns; `None` otherwise
    pub async fn update_owned(
        pool: &PgPool,
        id: i64,
        user_id: i64,
        data: UpdateBoard,
    ) -> Result<Option<Self>, sqlx::Error> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            UPDATE boards b
            SET name = COALESCE($3, b.name),
                position = COALESCE($4, b.position),
                updated_at = NOW()
            FROM projects p
            WHERE b.id = $1 AND p.id = b.project_id AND p.user_id = $2
            RETURNING b.id, b.project_id, b.name, b.position, b.created_at, b.updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(data.name)
        .bind(data.position)
        .fetch_optional(pool)
        .await?;

        if board.is_some() {
            tracing::info!(board_id = id, user_id, "Board updated");
        }
        Ok(board)
    }

    /// Deletes a board the user owns together with its tasks
    pub async fn delete_owned(pool: &PgPool, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM boards b
            USING projects p
            WHERE b.id = $1 AND p.id = b.project_id AND p.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!(board_id = id, user_id, "Board deleted");
        }
        Ok(deleted)
    }
}
