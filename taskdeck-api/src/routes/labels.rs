/// Label endpoints
///
/// Labels belong to a project and can be attached to any task on that
/// project's boards.

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
    models::label::{CreateLabel, Label, UpdateLabel},
};

pub async fn create_label(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateLabel>,
) -> ApiResult<(StatusCode, Json<Label>)> {
    let project_id = parse_id(&raw_id, "project")?;
    require_owned(&state.db, ResourceKind::Project, project_id, auth.user_id).await?;

    let label = Label::create(&state.db, project_id, req).await?;
    Ok((StatusCode::CREATED, Json(label)))
}

pub async fn list_labels(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Vec<Label>>> {
    let project_id = parse_id(&raw_id, "project")?;
    require_owned(&state.db, ResourceKind::Project, project_id, auth.user_id).await?;

    Ok(Json(Label::list_for_project(&state.db, project_id).await?))
}

/// Rename or recolor a label; absent fields are kept
pub async fn update_label(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateLabel>,
) -> ApiResult<Json<Label>> {
    let id = parse_id(&raw_id, "label")?;
    require_owned(&state.db, ResourceKind::Label, id, auth.user_id).await?;

    let label = Label::update_owned(&state.db, id, auth.user_id, req)
        .await?
        .ok_or_else(|| ApiError::not_found("Label"))?;

    Ok(Json(label))
}

pub async fn delete_label(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&raw_id, "label")?;
    require_owned(&state.db, ResourceKind::Label, id, auth.user_id).await?;

    if !Label::delete_owned(&state.db, id, auth.user_id).await? {
        return Err(ApiError::not_found("Label"));
    }

    Ok(deleted("Label"))
}
