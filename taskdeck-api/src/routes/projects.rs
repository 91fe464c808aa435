/// Project endpoints
///
/// Projects are the top of the ownership graph, so every query here filters
/// on `user_id` directly instead of going through the join-based gate.

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
    auth::middleware::AuthContext,
    models::project::{CreateProject, Project, UpdateProject},
};

/// Create a project
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<CreateProject>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let project = Project::create(&state.db, auth.user_id, req).await?;

    tracing::info!(project_id = project.id, user_id = auth.user_id, "Project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// List the caller's projects, newest first
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = Project::list_for_user(&state.db, auth.user_id).await?;
    Ok(Json(projects))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Project>> {
    let id = parse_id(&raw_id, "project")?;

    let project = Project::find_owned(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))?;

    Ok(Json(project))
}

/// Update a project
///
/// Absent fields are left alone; `"description": null` clears it.
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateProject>,
) -> ApiResult<Json<Project>> {
    let id = parse_id(&raw_id, "project")?;

    let project = Project::update_owned(&state.db, id, auth.user_id, req)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))?;

    Ok(Json(project))
}

/// Delete a project with everything under it
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&raw_id, "project")?;

    if !Project::delete_owned(&state.db, id, auth.user_id).await? {
        return Err(ApiError::not_found("Project"));
    }

    tracing::info!(project_id = id, user_id = auth.user_id, "Project deleted");
    Ok(deleted("Project"))
}
