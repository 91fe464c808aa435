/// Task endpoints
///
/// Create, update and move go through [`taskdeck_shared::mutation`], which
/// runs the ownership check, the row change, label reconciliation and the
/// history append in one transaction. The handlers here only parse IDs and
/// translate errors.
///
/// - `POST /api/boards/:id/tasks`
/// - `GET /api/boards/:id/tasks`
/// - `GET|PUT|DELETE /api/tasks/:id`
/// - `PATCH /api/tasks/:id/move`
/// - `GET /api/tasks/:id/history`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{parse_id, ValidatedJson},
    routes::{deleted, MessageResponse},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use taskdeck_shared::{
    auth::{
        middleware::AuthContext,
        ownership::{require_owned, ResourceKind},
    },
    models::{
        history::{HistoryEntry, HistoryEntryWithUser},
        task::{CreateTask, MoveTask, Task, TaskWithLabels, UpdateTask},
    },
    mutation,
};

/// Create a task on a board
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, or a label from another project
/// - `404 Not Found`: Board absent or not the caller's
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateTask>,
) -> ApiResult<(StatusCode, Json<TaskWithLabels>)> {
    let board_id = parse_id(&raw_id, "board")?;

    let task = mutation::create_task(&state.db, auth.user_id, board_id, req).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Tasks of a board by position, each with its labels
pub async fn list_board_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Vec<TaskWithLabels>>> {
    let board_id = parse_id(&raw_id, "board")?;
    require_owned(&state.db, ResourceKind::Board, board_id, auth.user_id).await?;

    let tasks = Task::list_for_board(&state.db, board_id).await?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<TaskWithLabels>> {
    let id = parse_id(&raw_id, "task")?;
    require_owned(&state.db, ResourceKind::Task, id, auth.user_id).await?;

    // Deleted between the gate and the read
    let task = Task::find_with_labels(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task"))?;

    Ok(Json(task))
}

/// Update a task
///
/// Only the fields present in the body change; `null` clears description,
/// assignee and due date. `label_ids` replaces the whole label set.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateTask>,
) -> ApiResult<Json<TaskWithLabels>> {
    let id = parse_id(&raw_id, "task")?;

    let task = mutation::update_task(&state.db, auth.user_id, id, req).await?;
    Ok(Json(task))
}

/// Move a task to another board of the caller's
pub async fn move_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
    ValidatedJson(req): ValidatedJson<MoveTask>,
) -> ApiResult<Json<TaskWithLabels>> {
    let id = parse_id(&raw_id, "task")?;

    let task = mutation::move_task(&state.db, auth.user_id, id, req).await?;

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&raw_id, "task")?;
    require_owned(&state.db, ResourceKind::Task, id, auth.user_id).await?;

    if !Task::delete_owned(&state.db, id, auth.user_id).await? {
        return Err(ApiError::not_found("Task"));
    }

    Ok(deleted("Task"))
}

/// History of a task, newest first
pub async fn task_history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Vec<HistoryEntryWithUser>>> {
    let id = parse_id(&raw_id, "task")?;
    require_owned(&state.db, ResourceKind::Task, id, auth.user_id).await?;

    let history = HistoryEntry::list_for_task(&state.db, id).await?;
    Ok(Json(history))
}
