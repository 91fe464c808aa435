/// Database models
///
/// Each model is a `sqlx::FromRow` struct with its queries as associated
/// functions taking a pool or executor.
///
/// # Models
///
/// - [`user`]: accounts, local or Google-linked
/// - [`project`]: top of the ownership chain, owned by one user
/// - [`board`]: ordered columns inside a project
/// - [`task`]: work items on a board
/// - [`label`]: project-scoped tags attachable to tasks
/// - [`comment`]: task discussion, editable by the author only
/// - [`attachment`]: metadata for files held in the object store
/// - [`history`]: append-only task change log
///
/// Reads of anything below a project go through the ownership gate
/// ([`crate::auth::ownership`]) first; deletes and updates of non-top-level
/// rows repeat the ownership predicate in their own `WHERE` clause.

pub mod attachment;
pub mod board;
pub mod comment;
pub mod history;
pub mod label;
pub mod project;
pub mod task;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Deserializes a field that distinguishes "absent" from explicit `null`
///
/// Use with `#[serde(default, deserialize_with = "double_option")]` on an
/// `Option<Option<T>>`: a missing key stays `None`, `null` becomes
/// `Some(None)` and a value becomes `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        description: Option<Option<String>>,
    }

    #[test]
    fn test_double_option_absent_null_value() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.description, None);

        let null: Patch = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(null.description, Some(None));

        let value: Patch = serde_json::from_str(r#"{"description": "x"}"#).unwrap();
        assert_eq!(value.description, Some(Some("x".to_string())));
    }
}
