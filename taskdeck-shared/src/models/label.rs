/// Label model
///
/// Labels belong to a project and may only be attached to tasks on boards
/// of that same project. The `task_labels` join table holds the
/// associations, keyed on `(task_id, label_id)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use validator::Validate;

use super::project::DEFAULT_COLOR;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Label {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLabel {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 20, message = "Color must be 1-20 characters"))]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateLabel {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 20, message = "Color must be 1-20 characters"))]
    pub color: Option<String>,
}

/// Label joined with the task it is attached to
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct TaskLabelRow {
    pub task_id: i64,
    #[sqlx(flatten)]
    pub label: Label,
}

impl Label {
    pub async fn create(
        pool: &PgPool,
        project_id: i64,
        data: CreateLabel,
    ) -> Result<Self, sqlx::Error> {
        let label = sqlx::query_as::<_, Label>(
            r#"
            INSERT INTO labels (project_id, name, color)
            VALUES ($1, $2, $3)
            RETURNING id, project_id, name, color, created_at
            "#,
        )
        .bind(project_id)
        .bind(data.name)
        .bind(data.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()))
        .fetch_one(pool)
        .await?;

        tracing::info!(label_id = label.id, project_id, "Label created");
        Ok(label)
    }

    /// Labels of a project, oldest first
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Label>(
            r#"
            SELECT id, project_id, name, color, created_at
            FROM labels
            WHERE project_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Labels attached to one task
    pub async fn for_task<'e, E>(executor: E, task_id: i64) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Label>(
            r#"
            SELECT l.id, l.project_id, l.name, l.color, l.created_at
            FROM labels l
            JOIN task_labels tl ON tl.label_id = l.id
            WHERE tl.task_id = $1
            ORDER BY l.created_at ASC, l.id ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(executor)
        .await
    }

    /// Labels attached to any of the given tasks
    pub(crate) async fn for_tasks(
        pool: &PgPool,
        task_ids: &[i64],
    ) -> Result<Vec<TaskLabelRow>, sqlx::Error> {
        sqlx::query_as::<_, TaskLabelRow>(
            r#"
            SELECT tl.task_id, l.id, l.project_id, l.name, l.color, l.created_at
            FROM task_labels tl
            JOIN labels l ON l.id = tl.label_id
            WHERE tl.task_id = ANY($1)
            ORDER BY l.created_at ASC, l.id ASC
            "#,
        )
        .bind(task_ids)
        .fetch_all(pool)
        .await
    }

    /// Partial update of a label the user owns
    pub async fn update_owned(
        pool: &PgPool,
        id: i64,
        user_id: i64,
        data: UpdateLabel,
    ) -> Result<Option<Self>, sqlx::Error> {
        let label = sqlx::query_as::<_, Label>(
            r#"
            UPDATE labels l
            SET name = COALESCE($3, l.name),
                color = COALESCE($4, l.color)
            FROM projects p
            WHERE l.id = $1 AND p.id = l.project_id AND p.user_id = $2
            RETURNING l.id, l.project_id, l.name, l.color, l.created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(data.name)
        .bind(data.color)
        .fetch_optional(pool)
        .await?;

        if label.is_some() {
            tracing::info!(label_id = id, user_id, "Label updated");
        }
        Ok(label)
    }

    /// Deletes a label the user owns and detaches it from every task
    pub async fn delete_owned(pool: &PgPool, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM labels l
            USING projects p
            WHERE l.id = $1 AND p.id = l.project_id AND p.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!(label_id = id, user_id, "Label deleted");
        }
        Ok(deleted)
    }
}
