/// Task mutation protocol
///
/// Creating, updating and moving a task each run in one transaction:
///
/// ```text
/// begin ─▶ ownership check ─▶ row write ─▶ labels ─▶ history ─▶ commit
///    └──────────────── any error: transaction dropped, rolled back ───┘
/// ```
///
/// The transaction is owned by the operation. Returning early with `?`, or
/// the request future being dropped mid-way, drops it and Postgres rolls
/// back, so a task never exists without its history entry and never carries
/// a half-applied label set.
///
/// Labels attached to a task must belong to the project of the task's board.
/// An ID that fails this check aborts the whole operation with
/// [`MutationError::InvalidLabel`].

use serde_json::{json, Map, Value as JsonValue};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::{debug, info};

use crate::auth::ownership::{is_owned, ResourceKind};
use crate::models::history::{HistoryAction, HistoryEntry};
use crate::models::label::Label;
use crate::models::task::{
    CreateTask, MoveTask, Task, TaskWithLabels, UpdateTask, INITIAL_STATUS, TASK_COLUMNS,
};

#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    /// The task or board is absent or not the caller's
    #[error("{} not found", .0.title())]
    NotFound(ResourceKind),

    /// A label ID does not exist in the board's project
    #[error("Label {0} does not belong to this project")]
    InvalidLabel(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Sorted, de-duplicated copy of a label ID list
fn dedup_label_ids(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Attaches labels to a task, each required to share the board's project
async fn attach_labels(
    tx: &mut Transaction<'_, Postgres>,
    task_id: i64,
    board_id: i64,
    label_ids: &[i64],
) -> Result<(), MutationError> {
    for &label_id in label_ids {
        let inserted = sqlx::query(
            r#"
            INSERT INTO task_labels (task_id, label_id)
            SELECT $1, l.id
            FROM labels l
            JOIN boards b ON b.project_id = l.project_id
            WHERE l.id = $2 AND b.id = $3
            "#,
        )
        .bind(task_id)
        .bind(label_id)
        .bind(board_id)
        .execute(&mut **tx)
        .await?;

        if inserted.rows_affected() == 0 {
            debug!(task_id, label_id, "Rejecting label from another project");
            return Err(MutationError::InvalidLabel(label_id));
        }
    }

    Ok(())
}

/// Creates a task on a board the user owns
///
/// Priority defaults to medium, status starts as `todo`, and position
/// defaults to one past the board's current maximum (0 on an empty board).
/// Records a `created` history entry holding the title.
pub async fn create_task(
    pool: &PgPool,
    user_id: i64,
    board_id: i64,
    data: CreateTask,
) -> Result<TaskWithLabels, MutationError> {
    let mut tx = pool.begin().await?;

    if !is_owned(&mut *tx, ResourceKind::Board, board_id, user_id).await? {
        return Err(MutationError::NotFound(ResourceKind::Board));
    }

    let position = match data.position {
        Some(position) => position,
        None => {
            sqlx::query_scalar::<_, i32>(
                "SELECT COALESCE(MAX(position) + 1, 0) FROM tasks WHERE board_id = $1",
            )
            .bind(board_id)
            .fetch_one(&mut *tx)
            .await?
        }
    };

    let task = sqlx::query_as::<_, Task>(&format!(
        r#"
        INSERT INTO tasks (board_id, title, description, status, priority, assignee_id, due_date, position)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {TASK_COLUMNS}
        "#
    ))
    .bind(board_id)
    .bind(&data.title)
    .bind(&data.description)
    .bind(INITIAL_STATUS)
    .bind(data.priority.unwrap_or_default())
    .bind(data.assignee_id)
    .bind(data.due_date)
    .bind(position)
    .fetch_one(&mut *tx)
    .await?;

    attach_labels(&mut tx, task.id, board_id, &dedup_label_ids(&data.label_ids)).await?;

    HistoryEntry::append(
        &mut *tx,
        task.id,
        user_id,
        HistoryAction::Created,
        &json!({ "title": task.title }),
    )
    .await?;

    let labels = Label::for_task(&mut *tx, task.id).await?;
    tx.commit().await?;

    info!(task_id = task.id, board_id, user_id, "Task created");
    Ok(TaskWithLabels { task, labels })
}

/// Applies a partial update to a task the user owns
///
/// Only fields present in `data` are written, and exactly those fields make
/// up the `updated` history entry. `label_ids` replaces the whole label
/// set. A request with no fields at all changes nothing and records nothing.
pub async fn update_task(
    pool: &PgPool,
    user_id: i64,
    task_id: i64,
    data: UpdateTask,
) -> Result<TaskWithLabels, MutationError> {
    let mut tx = pool.begin().await?;

    if !is_owned(&mut *tx, ResourceKind::Task, task_id, user_id).await? {
        return Err(MutationError::NotFound(ResourceKind::Task));
    }

    let mut changes = Map::new();
    let mut builder = QueryBuilder::<Postgres>::new("UPDATE tasks SET ");
    {
        let mut set = builder.separated(", ");

        if let Some(title) = data.title {
            changes.insert("title".into(), json!(title));
            set.push("title = ").push_bind_unseparated(title);
        }
        if let Some(description) = data.description {
            changes.insert("description".into(), json!(description));
            set.push("description = ").push_bind_unseparated(description);
        }
        if let Some(status) = data.status {
            changes.insert("status".into(), json!(status));
            set.push("status = ").push_bind_unseparated(status);
        }
        if let Some(priority) = data.priority {
            changes.insert("priority".into(), json!(priority));
            set.push("priority = ").push_bind_unseparated(priority);
        }
        if let Some(assignee_id) = data.assignee_id {
            changes.insert("assignee_id".into(), json!(assignee_id));
            set.push("assignee_id = ").push_bind_unseparated(assignee_id);
        }
        if let Some(due_date) = data.due_date {
            changes.insert("due_date".into(), json!(due_date));
            set.push("due_date = ").push_bind_unseparated(due_date);
        }
        if let Some(position) = data.position {
            changes.insert("position".into(), json!(position));
            set.push("position = ").push_bind_unseparated(position);
        }

        set.push("updated_at = NOW()");
    }

    if changes.is_empty() && data.label_ids.is_none() {
        let task = Task::find_by_id(&mut *tx, task_id)
            .await?
            .ok_or(MutationError::NotFound(ResourceKind::Task))?;
        let labels = Label::for_task(&mut *tx, task_id).await?;
        tx.commit().await?;

        debug!(task_id, "Empty task update, nothing recorded");
        return Ok(TaskWithLabels { task, labels });
    }

    builder
        .push(" WHERE id = ")
        .push_bind(task_id)
        .push(format!(" RETURNING {TASK_COLUMNS}"));

    let task = builder
        .build_query_as::<Task>()
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(MutationError::NotFound(ResourceKind::Task))?;

    if let Some(label_ids) = data.label_ids {
        let label_ids = dedup_label_ids(&label_ids);

        sqlx::query("DELETE FROM task_labels WHERE task_id = $1")
            .bind(task_id)
            .execute(&mut *tx)
            .await?;
        attach_labels(&mut tx, task_id, task.board_id, &label_ids).await?;

        changes.insert("labels".into(), json!(label_ids));
    }

    let changed_fields: Vec<String> = changes.keys().cloned().collect();
    HistoryEntry::append(
        &mut *tx,
        task_id,
        user_id,
        HistoryAction::Updated,
        &JsonValue::Object(changes),
    )
    .await?;

    let labels = Label::for_task(&mut *tx, task_id).await?;
    tx.commit().await?;

    info!(task_id, user_id, fields = ?changed_fields, "Task updated");
    Ok(TaskWithLabels { task, labels })
}

/// Moves a task the user owns onto another board the user owns
///
/// Labels from a different project than the destination board's are
/// detached. Records a `moved` history entry with the destination board,
/// position and origin board.
pub async fn move_task(
    pool: &PgPool,
    user_id: i64,
    task_id: i64,
    data: MoveTask,
) -> Result<TaskWithLabels, MutationError> {
    let mut tx = pool.begin().await?;

    let from_board_id: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT t.board_id
        FROM tasks t
        JOIN boards b ON b.id = t.board_id
        JOIN projects p ON p.id = b.project_id
        WHERE t.id = $1 AND p.user_id = $2
        FOR UPDATE OF t
        "#,
    )
    .bind(task_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(from_board_id) = from_board_id else {
        return Err(MutationError::NotFound(ResourceKind::Task));
    };

    // Both ends of the move must be the caller's at write time
    let task = sqlx::query_as::<_, Task>(&format!(
        r#"
        UPDATE tasks t
        SET board_id = $1, position = $2, updated_at = NOW()
        WHERE t.id = $3
          AND EXISTS (
              SELECT 1 FROM boards b JOIN projects p ON p.id = b.project_id
              WHERE b.id = t.board_id AND p.user_id = $4
          )
          AND EXISTS (
              SELECT 1 FROM boards b JOIN projects p ON p.id = b.project_id
              WHERE b.id = $1 AND p.user_id = $4
          )
        RETURNING {TASK_COLUMNS}
        "#
    ))
    .bind(data.board_id)
    .bind(data.position)
    .bind(task_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(MutationError::NotFound(ResourceKind::Board))?;

    let pruned = sqlx::query(
        r#"
        DELETE FROM task_labels tl
        USING labels l, boards b
        WHERE tl.task_id = $1
          AND l.id = tl.label_id
          AND b.id = $2
          AND l.project_id <> b.project_id
        "#,
    )
    .bind(task_id)
    .bind(data.board_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    HistoryEntry::append(
        &mut *tx,
        task_id,
        user_id,
        HistoryAction::Moved,
        &json!({
            "board_id": data.board_id,
            "position": data.position,
            "from_board_id": from_board_id,
        }),
    )
    .await?;

    let labels = Label::for_task(&mut *tx, task_id).await?;
    tx.commit().await?;

    info!(
        task_id,
        user_id,
        from_board_id,
        to_board_id = data.board_id,
        labels_detached = pruned,
        "Task moved"
    );
    Ok(TaskWithLabels { task, labels })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_label_ids() {
        assert_eq!(dedup_label_ids(&[3, 1, 3, 2, 1]), vec![1, 2, 3]);
        assert!(dedup_label_ids(&[]).is_empty());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            MutationError::NotFound(ResourceKind::Board).to_string(),
            "Board not found"
        );
        assert_eq!(
            MutationError::InvalidLabel(7).to_string(),
            "Label 7 does not belong to this project"
        );
    }
}
