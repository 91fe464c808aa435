/// Task model
///
/// Tasks sit on a board and carry a free-form status, a priority, an
/// optional assignee and due date, and a set of labels. Creating, updating
/// and moving tasks happens in [`crate::mutation`] so that every change
/// lands together with its history entry; this module holds the row types,
/// request bodies and read queries.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     board_id BIGINT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status VARCHAR(50) NOT NULL DEFAULT 'todo',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     assignee_id BIGINT REFERENCES users(id) ON DELETE SET NULL,
///     due_date TIMESTAMPTZ,
///     position INTEGER NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use validator::Validate;

use super::double_option;
use super::label::Label;

/// Status every new task starts in
pub const INITIAL_STATUS: &str = "todo";

pub(crate) const TASK_COLUMNS: &str = "id, board_id, title, description, status, priority, \
     assignee_id, due_date, position, created_at, updated_at";

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub board_id: i64,
    pub title: String,
    pub description: Option<String>,

    /// Free-form workflow state, `todo` on creation
    pub status: String,

    pub priority: Priority,
    pub assignee_id: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,

    /// Sort key within the board, ascending
    pub position: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task together with its labels, the shape every task endpoint returns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskWithLabels {
    #[serde(flatten)]
    pub task: Task,
    pub labels: Vec<Label>,
}

/// Body of `POST /boards/:id/tasks`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateTask {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    pub description: Option<String>,

    /// Defaults to medium
    pub priority: Option<Priority>,

    pub assignee_id: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,

    /// Defaults to one past the current last task on the board
    pub position: Option<i32>,

    #[serde(default)]
    pub label_ids: Vec<i64>,
}

/// Body of `PUT /tasks/:id`
///
/// Absent fields are untouched. The nullable columns use a double option so
/// an explicit `null` clears them. `label_ids`, when present, replaces the
/// whole label set.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    #[validate(length(min = 1, max = 50, message = "Status must be 1-50 characters"))]
    pub status: Option<String>,

    pub priority: Option<Priority>,

    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<i64>>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    pub position: Option<i32>,

    pub label_ids: Option<Vec<i64>>,
}

/// Body of `PATCH /tasks/:id/move`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MoveTask {
    #[validate(range(min = 1, message = "Invalid board ID"))]
    pub board_id: i64,

    pub position: i32,
}

impl Task {
    /// Fetches a task by ID without any ownership check
    ///
    /// Only call this after the task has passed the ownership gate.
    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Fetches a task and its labels by ID
    pub async fn find_with_labels(
        pool: &PgPool,
        id: i64,
    ) -> Result<Option<TaskWithLabels>, sqlx::Error> {
        let Some(task) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let labels = Label::for_task(pool, id).await?;
        Ok(Some(TaskWithLabels { task, labels }))
    }

    /// Tasks of a board by position, each with its labels
    pub async fn list_for_board(
        pool: &PgPool,
        board_id: i64,
    ) -> Result<Vec<TaskWithLabels>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE board_id = $1
            ORDER BY position ASC, id ASC
            "#
        ))
        .bind(board_id)
        .fetch_all(pool)
        .await?;

        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        let mut labels_by_task: HashMap<i64, Vec<Label>> = HashMap::new();
        for row in Label::for_tasks(pool, &ids).await? {
            labels_by_task.entry(row.task_id).or_default().push(row.label);
        }

        Ok(tasks
            .into_iter()
            .map(|task| {
                let labels = labels_by_task.remove(&task.id).unwrap_or_default();
                TaskWithLabels { task, labels }
            })
            .collect())
    }

    /// Deletes a task the user owns with its comments, attachments and history
    pub async fn delete_owned(pool: &PgPool, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM tasks t
            USING boards b, projects p
            WHERE t.id = $1
              AND b.id = t.board_id
              AND p.id = b.project_id
              AND p.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!(task_id = id, user_id, "Task deleted");
        }
        Ok(deleted)
    }
}
