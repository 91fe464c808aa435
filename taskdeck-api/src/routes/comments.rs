/// Comment endpoints
///
/// Anyone who owns the task may comment and read comments. Editing and
/// deleting is further limited to the author; for everyone else the
/// comment does not exist.

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
    models::comment::{Comment, CommentBody, CommentWithAuthor},
};

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CommentBody>,
) -> ApiResult<(StatusCode, Json<CommentWithAuthor>)> {
    let task_id = parse_id(&raw_id, "task")?;
    require_owned(&state.db, ResourceKind::Task, task_id, auth.user_id).await?;

    let comment = Comment::create(&state.db, task_id, auth.user_id, &req.content).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Comments of a task, oldest first
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Vec<CommentWithAuthor>>> {
    let task_id = parse_id(&raw_id, "task")?;
    require_owned(&state.db, ResourceKind::Task, task_id, auth.user_id).await?;

    Ok(Json(Comment::list_for_task(&state.db, task_id).await?))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CommentBody>,
) -> ApiResult<Json<CommentWithAuthor>> {
    let id = parse_id(&raw_id, "comment")?;
    require_owned(&state.db, ResourceKind::Comment, id, auth.user_id).await?;

    let comment = Comment::update_authored(&state.db, id, auth.user_id, &req.content)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))?;

    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&raw_id, "comment")?;
    require_owned(&state.db, ResourceKind::Comment, id, auth.user_id).await?;

    if !Comment::delete_authored(&state.db, id, auth.user_id).await? {
        return Err(ApiError::not_found("Comment"));
    }

    Ok(deleted("Comment"))
}
