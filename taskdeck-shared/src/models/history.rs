/// Task history
///
/// An append-only log of task changes. Entries are written only by the
/// mutation protocol, inside the same transaction as the change they
/// describe, and are never updated; the schema rejects `UPDATE` on the
/// table outright. They disappear only when their task is deleted.
///
/// `changes` is a JSON object holding the fields the change touched:
///
/// | action    | changes                                            |
/// |-----------|----------------------------------------------------|
/// | `created` | `{"title": ...}`                                   |
/// | `updated` | every field present in the update request          |
/// | `moved`   | `{"board_id": ..., "position": ..., "from_board_id": ...}` |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{PgExecutor, PgPool};

use super::user::UserSummary;

/// Stored as text in `task_history.action`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Created,
    Updated,
    Moved,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HistoryEntry {
    pub id: i64,
    pub task_id: i64,

    /// Acting user
    pub user_id: i64,

    pub action: HistoryAction,
    pub changes: JsonValue,
    pub created_at: DateTime<Utc>,
}

/// History entry with the acting user embedded under `user`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntryWithUser {
    #[serde(flatten)]
    pub entry: HistoryEntry,
    pub user: UserSummary,
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    #[sqlx(flatten)]
    entry: HistoryEntry,
    username: String,
    email: String,
    avatar_url: Option<String>,
}

impl HistoryEntry {
    /// Appends an entry; pass the open transaction of the change it records
    pub async fn append<'e, E>(
        executor: E,
        task_id: i64,
        user_id: i64,
        action: HistoryAction,
        changes: &JsonValue,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, HistoryEntry>(
            r#"
            INSERT INTO task_history (task_id, user_id, action, changes)
            VALUES ($1, $2, $3, $4)
            RETURNING id, task_id, user_id, action, changes, created_at
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .bind(action)
        .bind(changes)
        .fetch_one(executor)
        .await
    }

    /// History of a task, most recent first
    pub async fn list_for_task(
        pool: &PgPool,
        task_id: i64,
    ) -> Result<Vec<HistoryEntryWithUser>, sqlx::Error> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT h.id, h.task_id, h.user_id, h.action, h.changes, h.created_at,
                   u.username, u.email, u.avatar_url
            FROM task_history h
            JOIN users u ON u.id = h.user_id
            WHERE h.task_id = $1
            ORDER BY h.created_at DESC, h.id DESC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| HistoryEntryWithUser {
                user: UserSummary {
                    id: row.entry.user_id,
                    username: row.username,
                    email: row.email,
                    avatar_url: row.avatar_url,
                },
                entry: row.entry,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serializes_lowercase() {
        assert_eq!(serde_json::to_value(HistoryAction::Moved).unwrap(), "moved");
        assert_eq!(
            serde_json::from_str::<HistoryAction>(r#""created""#).unwrap(),
            HistoryAction::Created
        );
    }

    #[test]
    fn test_action_binds_as_varchar() {
        use sqlx::postgres::{PgTypeInfo, Postgres};
        use sqlx::TypeInfo;

        let info = <HistoryAction as sqlx::Type<Postgres>>::type_info();
        assert_eq!(info.name(), "varchar");
        assert!(<HistoryAction as sqlx::Type<Postgres>>::compatible(
            &PgTypeInfo::with_name("varchar")
        ));
    }
}
