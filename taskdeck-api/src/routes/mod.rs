/// API route handlers
///
/// One module per resource. Every handler that takes an `:id` parses it
/// first (400 on garbage) and then passes the ownership gate (404 when
/// the resource is absent or someone else's) before touching any data.

pub mod attachments;
pub mod auth;
pub mod boards;
pub mod comments;
pub mod health;
pub mod labels;
pub mod projects;
pub mod tasks;

use serde::Serialize;

/// Body of a successful DELETE
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub(crate) fn deleted(kind: &str) -> axum::Json<MessageResponse> {
    axum::Json(MessageResponse {
        message: format!("{} deleted successfully", kind),
    })
}
