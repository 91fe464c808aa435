/// Attachment endpoints
///
/// Uploads are `multipart/form-data` with a single `file` field. The bytes
/// go to the object store under `tasks/{task_id}/{unix_ts}-{filename}`;
/// only the public URL and metadata are kept in the database.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::parse_id,
    routes::{deleted, MessageResponse},
};
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use bytes::Bytes;
use chrono::Utc;
use taskdeck_shared::{
    auth::{
        middleware::AuthContext,
        ownership::{require_owned, ResourceKind},
    },
    models::attachment::{Attachment, NewAttachment},
    storage::object_key,
};

struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    body: Bytes,
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::BadRequest(err.body_text())
}

/// Pulls the `file` field out of the form, skipping anything else
async fn read_file_field(multipart: &mut Multipart) -> ApiResult<UploadedFile> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ApiError::BadRequest("File name is required".to_string()))?;
        let content_type = field.content_type().map(str::to_string);
        let body = field.bytes().await.map_err(multipart_error)?;

        return Ok(UploadedFile {
            filename,
            content_type,
            body,
        });
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

/// Upload a file to a task
///
/// # Errors
///
/// - `400 Bad Request`: No `file` field, or the body exceeds the upload limit
/// - `404 Not Found`: Task absent or not the caller's
/// - `500 Internal Server Error`: The object store refused the upload
pub async fn upload_attachment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Attachment>)> {
    let task_id = parse_id(&raw_id, "task")?;
    require_owned(&state.db, ResourceKind::Task, task_id, auth.user_id).await?;

    let file = read_file_field(&mut multipart).await?;
    let key = object_key(task_id, Utc::now().timestamp(), &file.filename);
    let size = file.body.len() as i64;

    let file_url = state
        .store
        .put(&key, file.body, file.content_type.as_deref())
        .await?;

    let attachment = match Attachment::create(
        &state.db,
        NewAttachment {
            task_id,
            filename: file.filename,
            file_url: file_url.clone(),
            file_type: file.content_type,
            size: Some(size),
        },
    )
    .await
    {
        Ok(attachment) => attachment,
        Err(e) => {
            // Task deleted mid-upload; the blob would be orphaned
            if let Err(cleanup) = state.store.delete(&file_url).await {
                tracing::warn!(error = %cleanup, file_url = %file_url, "Failed to remove orphaned upload");
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        attachment_id = attachment.id,
        task_id,
        size,
        "Attachment uploaded"
    );
    Ok((StatusCode::CREATED, Json(attachment)))
}

/// Attachments of a task, newest first
pub async fn list_attachments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Vec<Attachment>>> {
    let task_id = parse_id(&raw_id, "task")?;
    require_owned(&state.db, ResourceKind::Task, task_id, auth.user_id).await?;

    Ok(Json(Attachment::list_for_task(&state.db, task_id).await?))
}

/// Delete an attachment row, then its blob
///
/// The blob removal is best effort: once the row is gone the request
/// succeeds even if the store refuses.
pub async fn delete_attachment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&raw_id, "attachment")?;
    require_owned(&state.db, ResourceKind::Attachment, id, auth.user_id).await?;

    let attachment = Attachment::delete_owned(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Attachment"))?;

    if let Err(e) = state.store.delete(&attachment.file_url).await {
        tracing::warn!(
            error = %e,
            attachment_id = id,
            file_url = %attachment.file_url,
            "Failed to delete attachment blob"
        );
    }

    Ok(deleted("Attachment"))
}
