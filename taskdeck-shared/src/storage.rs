/// Attachment blob storage
///
/// Attachment bytes live in an external object store speaking the Supabase
/// storage HTTP API:
///
/// - upload: `POST {base}/storage/v1/object/{bucket}/{key}`
/// - delete: `DELETE {base}/storage/v1/object/{bucket}/{key}`
/// - public URL: `{base}/storage/v1/object/public/{bucket}/{key}`
///
/// all authenticated with `Authorization: Bearer {api_key}`. Keys are
/// `tasks/{task_id}/{unix_ts}-{sanitized filename}`.
///
/// Handlers talk to the [`ObjectStore`] trait so tests can swap in an
/// in-memory store.

use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No object store URL or key configured
    #[error("Object storage is not configured")]
    NotConfigured,

    /// Transport failure talking to the store
    #[error("Object storage request failed: {0}")]
    Request(String),

    /// Store answered with a non-success status
    #[error("Object storage returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// URL does not point into this store's bucket
    #[error("URL is not managed by this store: {0}")]
    ForeignUrl(String),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `body` under `key` and returns its public URL
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<String, StorageError>;

    /// Removes the object behind a URL previously returned by [`ObjectStore::put`]
    async fn delete(&self, file_url: &str) -> Result<(), StorageError>;
}

/// Makes a client-supplied filename safe to use in an object key
///
/// Drops any directory part, keeps ASCII alphanumerics plus `.`, `-` and
/// `_`, and replaces everything else with `_`.
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim_start_matches('.');

    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(200)
        .collect();

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Object key for an upload to a task
pub fn object_key(task_id: i64, unix_ts: i64, filename: &str) -> String {
    format!("tasks/{}/{}-{}", task_id, unix_ts, sanitize_filename(filename))
}

#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    /// Base URL, e.g. `https://project.supabase.co`
    pub url: String,
    pub api_key: String,
    pub bucket: String,
}

/// [`ObjectStore`] over the Supabase storage HTTP API
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    http: reqwest::Client,
    config: ObjectStoreConfig,
}

impl HttpObjectStore {
    pub fn new(mut config: ObjectStoreConfig) -> Self {
        config.url = config.url.trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn ensure_configured(&self) -> Result<(), StorageError> {
        if self.config.url.is_empty() || self.config.api_key.is_empty() {
            return Err(StorageError::NotConfigured);
        }
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.url, self.config.bucket, key
        )
    }

    /// Public URL for a key
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.url, self.config.bucket, key
        )
    }

    /// Recovers the key from a public URL of this store
    pub fn key_from_public_url<'a>(&self, file_url: &'a str) -> Option<&'a str> {
        let prefix = self.public_url("");
        file_url.strip_prefix(prefix.as_str()).filter(|k| !k.is_empty())
    }

    async fn check(response: reqwest::Response) -> Result<(), StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(StorageError::Upstream {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        self.ensure_configured()?;

        let size = body.len();
        let response = self
            .http
            .post(self.object_url(key))
            .bearer_auth(&self.config.api_key)
            .header(
                reqwest::header::CONTENT_TYPE,
                content_type.unwrap_or("application/octet-stream"),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.without_url().to_string()))?;

        Self::check(response).await?;

        tracing::debug!(key, size, "Object uploaded");
        Ok(self.public_url(key))
    }

    async fn delete(&self, file_url: &str) -> Result<(), StorageError> {
        self.ensure_configured()?;

        let key = self
            .key_from_public_url(file_url)
            .ok_or_else(|| StorageError::ForeignUrl(file_url.to_string()))?;

        let response = self
            .http
            .delete(self.object_url(key))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.without_url().to_string()))?;

        Self::check(response).await?;

        tracing::debug!(key, "Object deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> HttpObjectStore {
        HttpObjectStore::new(ObjectStoreConfig {
            url: "https://store.example.com/".to_string(),
            api_key: "service-key".to_string(),
            bucket: "taskdeck-attachments".to_string(),
        })
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\notes.txt"), "notes.txt");
        assert_eq!(sanitize_filename("my file (1).png"), "my_file__1_.png");
        assert_eq!(sanitize_filename(".."), "file");
        assert_eq!(sanitize_filename(""), "file");
        assert_eq!(sanitize_filename(&"a".repeat(500)).len(), 200);
    }

    #[test]
    fn test_object_key() {
        assert_eq!(
            object_key(42, 1_700_000_000, "screen shot.png"),
            "tasks/42/1700000000-screen_shot.png"
        );
    }

    #[test]
    fn test_public_url_round_trip() {
        let store = store();
        let url = store.public_url("tasks/1/1-a.txt");

        assert_eq!(
            url,
            "https://store.example.com/storage/v1/object/public/taskdeck-attachments/tasks/1/1-a.txt"
        );
        assert_eq!(store.key_from_public_url(&url), Some("tasks/1/1-a.txt"));
        assert_eq!(store.key_from_public_url("https://elsewhere/x"), None);
    }

    #[tokio::test]
    async fn test_unconfigured_store() {
        let store = HttpObjectStore::new(ObjectStoreConfig {
            url: String::new(),
            api_key: String::new(),
            bucket: "b".to_string(),
        });

        let result = store.put("k", Bytes::from_static(b"x"), None).await;
        assert!(matches!(result, Err(StorageError::NotConfigured)));
    }

    #[test]
    fn test_upstream_error_hides_credentials() {
        let err = StorageError::Upstream {
            status: 403,
            body: "forbidden".to_string(),
        };
        let message = err.to_string();

        assert_eq!(message, "Object storage returned 403: forbidden");
        assert!(!message.contains("service-key"));
    }
}
