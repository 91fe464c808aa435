/// Board endpoints
///
/// - `POST|GET /api/projects/:id/boards`
/// - `PUT|DELETE /api/boards/:id`
///
/// Listing a board's tasks lives in [`super::tasks::list_board_tasks`].

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
    models::board::{Board, CreateBoard, UpdateBoard},
};

pub async fn create_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateBoard>,
) -> ApiResult<(StatusCode, Json<Board>)> {
    let project_id = parse_id(&raw_id, "project")?;
    require_owned(&state.db, ResourceKind::Project, project_id, auth.user_id).await?;

    let board = Board::create(&state.db, project_id, req).await?;

    tracing::info!(board_id = board.id, project_id, "Board created");
    Ok((StatusCode::CREATED, Json(board)))
}

/// Boards of a project ordered by position
pub async fn list_boards(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Vec<Board>>> {
    let project_id = parse_id(&raw_id, "project")?;
    require_owned(&state.db, ResourceKind::Project, project_id, auth.user_id).await?;

    let boards = Board::list_for_project(&state.db, project_id).await?;
    Ok(Json(boards))
}

pub async fn update_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateBoard>,
) -> ApiResult<Json<Board>> {
    let id = parse_id(&raw_id, "board")?;
    require_owned(&state.db, ResourceKind::Board, id, auth.user_id).await?;

    let board = Board::update_owned(&state.db, id, auth.user_id, req)
        .await?
        .ok_or_else(|| ApiError::not_found("Board"))?;

    Ok(Json(board))
}

/// Delete a board and its tasks
pub async fn delete_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&raw_id, "board")?;
    require_owned(&state.db, ResourceKind::Board, id, auth.user_id).await?;

    if !Board::delete_owned(&state.db, id, auth.user_id).await? {
        return Err(ApiError::not_found("Board"));
    }

    Ok(deleted("Board"))
}
