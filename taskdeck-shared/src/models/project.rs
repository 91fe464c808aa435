/// Project model
///
/// Projects are the root of the ownership chain: every board, label, task,
/// comment, attachment and history entry belongs to exactly one project,
/// and every project belongs to exactly one user. Deleting a project
/// cascades to all of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

use super::double_option;

/// Color given to projects and labels created without one
pub const DEFAULT_COLOR: &str = "#3B82F6";

const PROJECT_COLUMNS: &str = "id, user_id, name, description, color, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,

    /// Owner
    pub user_id: i64,

    pub name: String,
    pub description: Option<String>,

    /// Hex color, `#3B82F6` unless chosen
    pub color: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProject {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    pub description: Option<String>,

    #[validate(length(min = 1, max = 20, message = "Color must be 1-20 characters"))]
    pub color: Option<String>,
}

/// Partial update; absent fields are left alone, `description: null` clears it
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProject {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    #[validate(length(min = 1, max = 20, message = "Color must be 1-20 characters"))]
    pub color: Option<String>,
}

impl Project {
    pub async fn create(
        pool: &PgPool,
        user_id: i64,
        data: CreateProject,
    ) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (user_id, name, description, color)
            VALUES ($1, $2, $3, $4)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()))
        .fetch_one(pool)
        .await?;

        tracing::info!(project_id = project.id, user_id, "Project created");
        Ok(project)
    }

    /// Projects owned by the user, newest first
    pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Fetches a project only if the user owns it
    pub async fn find_owned(
        pool: &PgPool,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Applies a partial update; `None` when the project is not the user's
    pub async fn update_owned(
        pool: &PgPool,
        id: i64,
        user_id: i64,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let (set_description, description) = match data.description {
            Some(value) => (true, value),
            None => (false, None),
        };

        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET name = COALESCE($3, name),
                description = CASE WHEN $4 THEN $5 ELSE description END,
                color = COALESCE($6, color),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(data.name)
        .bind(set_description)
        .bind(description)
        .bind(data.color)
        .fetch_optional(pool)
        .await?;

        if project.is_some() {
            tracing::info!(project_id = id, user_id, "Project updated");
        }
        Ok(project)
    }

    /// Deletes the project and everything under it; `false` when not owned
    pub async fn delete_owned(pool: &PgPool, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!(project_id = id, user_id, "Project deleted");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_project_distinguishes_null_description() {
        let patch: UpdateProject = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(patch.description, Some(None));
        assert!(patch.name.is_none());

        let patch: UpdateProject = serde_json::from_str(r#"{"name": "Renamed"}"#).unwrap();
        assert_eq!(patch.description, None);
    }

    #[test]
    fn test_create_project_validation() {
        let ok = CreateProject {
            name: "Roadmap".to_string(),
            description: None,
            color: None,
        };
        assert!(ok.validate().is_ok());

        let empty = CreateProject {
            name: String::new(),
            ..ok
        };
        assert!(empty.validate().is_err());
    }
}
