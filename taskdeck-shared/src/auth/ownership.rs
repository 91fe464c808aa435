/// Ownership gate
///
/// Every resource belongs to exactly one user through the chain
/// project → board → task → {comment, attachment}, with labels hanging off
/// the project. A caller may see or touch a resource only if that chain ends
/// at them. The check is a single `SELECT EXISTS` joining from the
/// resource's table up to `projects`, run fresh on every request and never
/// cached.
///
/// A failed check is reported as "not found" so that callers cannot probe
/// for the existence of other users' resources.
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::auth::ownership::{require_owned, ResourceKind};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, user_id: i64) -> Result<(), Box<dyn std::error::Error>> {
/// require_owned(&pool, ResourceKind::Task, 42, user_id).await?;
/// # Ok(())
/// # }
/// ```

use std::fmt;

use serde::Serialize;
use sqlx::PgExecutor;

/// Resource kinds the gate knows how to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Project,
    Board,
    Task,
    Label,
    Comment,
    Attachment,
}

impl ResourceKind {
    /// Lowercase name, as used in error messages and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Project => "project",
            ResourceKind::Board => "board",
            ResourceKind::Task => "task",
            ResourceKind::Label => "label",
            ResourceKind::Comment => "comment",
            ResourceKind::Attachment => "attachment",
        }
    }

    /// Capitalized name for user-facing messages
    pub fn title(&self) -> &'static str {
        match self {
            ResourceKind::Project => "Project",
            ResourceKind::Board => "Board",
            ResourceKind::Task => "Task",
            ResourceKind::Label => "Label",
            ResourceKind::Comment => "Comment",
            ResourceKind::Attachment => "Attachment",
        }
    }

    /// Ownership query: `$1` is the resource ID, `$2` the user ID
    fn ownership_query(&self) -> &'static str {
        match self {
            ResourceKind::Project => {
                "SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1 AND user_id = $2)"
            }
            ResourceKind::Board => {
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM boards b
                    JOIN projects p ON p.id = b.project_id
                    WHERE b.id = $1 AND p.user_id = $2
                )
                "#
            }
            ResourceKind::Task => {
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM tasks t
                    JOIN boards b ON b.id = t.board_id
                    JOIN projects p ON p.id = b.project_id
                    WHERE t.id = $1 AND p.user_id = $2
                )
                "#
            }
            ResourceKind::Label => {
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM labels l
                    JOIN projects p ON p.id = l.project_id
                    WHERE l.id = $1 AND p.user_id = $2
                )
                "#
            }
            ResourceKind::Comment => {
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM comments c
                    JOIN tasks t ON t.id = c.task_id
                    JOIN boards b ON b.id = t.board_id
                    JOIN projects p ON p.id = b.project_id
                    WHERE c.id = $1 AND p.user_id = $2
                )
                "#
            }
            ResourceKind::Attachment => {
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM attachments a
                    JOIN tasks t ON t.id = a.task_id
                    JOIN boards b ON b.id = t.board_id
                    JOIN projects p ON p.id = b.project_id
                    WHERE a.id = $1 AND p.user_id = $2
                )
                "#
            }
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gate failure
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Absent, or owned by someone else; the two are indistinguishable
    #[error("{} not found", .0.title())]
    NotFound(ResourceKind),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Whether the resource exists and its chain ends at `user_id`
///
/// Accepts any executor, so it can run inside an open transaction.
pub async fn is_owned<'e, E>(
    executor: E,
    kind: ResourceKind,
    id: i64,
    user_id: i64,
) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let owned: bool = sqlx::query_scalar(kind.ownership_query())
        .bind(id)
        .bind(user_id)
        .fetch_one(executor)
        .await?;

    if !owned {
        tracing::debug!(kind = %kind, id, user_id, "Ownership check failed");
    }
    Ok(owned)
}

/// Like [`is_owned`], but turns a failed check into [`AuthzError::NotFound`]
pub async fn require_owned<'e, E>(
    executor: E,
    kind: ResourceKind,
    id: i64,
    user_id: i64,
) -> Result<(), AuthzError>
where
    E: PgExecutor<'e>,
{
    if is_owned(executor, kind, id, user_id).await? {
        Ok(())
    } else {
        Err(AuthzError::NotFound(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ResourceKind; 6] = [
        ResourceKind::Project,
        ResourceKind::Board,
        ResourceKind::Task,
        ResourceKind::Label,
        ResourceKind::Comment,
        ResourceKind::Attachment,
    ];

    #[test]
    fn test_every_query_ends_at_project_owner() {
        for kind in ALL {
            let sql = kind.ownership_query();
            assert!(sql.contains("SELECT EXISTS"), "{kind}");
            assert!(sql.contains("user_id = $2"), "{kind}");
            assert!(sql.contains("id = $1"), "{kind}");
        }
    }

    #[test]
    fn test_chain_depth_per_kind() {
        let joins = |kind: ResourceKind| kind.ownership_query().matches("JOIN").count();

        assert_eq!(joins(ResourceKind::Project), 0);
        assert_eq!(joins(ResourceKind::Board), 1);
        assert_eq!(joins(ResourceKind::Label), 1);
        assert_eq!(joins(ResourceKind::Task), 2);
        assert_eq!(joins(ResourceKind::Comment), 3);
        assert_eq!(joins(ResourceKind::Attachment), 3);
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            AuthzError::NotFound(ResourceKind::Task).to_string(),
            "Task not found"
        );
        assert_eq!(ResourceKind::Attachment.to_string(), "attachment");
    }
}
