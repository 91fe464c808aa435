/// Common test utilities for integration tests
///
/// - Test database setup (skipped when `DATABASE_URL` is unset)
/// - An in-memory object store standing in for the HTTP one
/// - Registration and request helpers driving the real router

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use rand::Rng;
use serde_json::Value;
use sqlx::PgPool;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use taskdeck_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskdeck_shared::{
    db::{
        migrations::run_migrations,
        pool::{create_pool, DatabaseConfig},
    },
    storage::{ObjectStore, StorageError},
};
use tower::ServiceExt;

pub const MEMORY_URL_PREFIX: &str = "memory://";

/// Object store keeping blobs in a map
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl MemoryStore {
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        _content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(format!("{}{}", MEMORY_URL_PREFIX, key))
    }

    async fn delete(&self, file_url: &str) -> Result<(), StorageError> {
        let key = file_url
            .strip_prefix(MEMORY_URL_PREFIX)
            .ok_or_else(|| StorageError::ForeignUrl(file_url.to_string()))?;
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub store: Arc<MemoryStore>,
}

/// A registered user and their access token
pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub token: String,
}

impl TestContext {
    /// Returns `None` when no test database is configured
    pub async fn new() -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok()?;

        let db = create_pool(DatabaseConfig::from_url(url.clone()))
            .await
            .expect("Failed to connect to test database");
        run_migrations(&db).await.expect("Migrations failed");

        let store = Arc::new(MemoryStore::default());
        let state = AppState::new(db.clone(), Config::for_tests(url)).with_store(store.clone());

        Some(TestContext {
            db,
            app: build_router(state),
            store,
        })
    }

    /// Sends a request and returns the status and parsed JSON body
    ///
    /// An empty body comes back as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.dispatch(request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// Uploads `content` as the multipart field `file`
    pub async fn upload(
        &self,
        uri: &str,
        token: &str,
        filename: &str,
        content: &[u8],
    ) -> (StatusCode, Value) {
        let boundary = "taskdeck-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: text/plain\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap();

        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    /// Registers a fresh user whose name starts with `prefix`
    pub async fn register(&self, prefix: &str) -> TestUser {
        let tag: u64 = rand::thread_rng().gen_range(0..1_000_000_000_000);
        let username = format!("{}{}", prefix, tag);

        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(serde_json::json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "secret123",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

        TestUser {
            id: body["user"]["id"].as_i64().unwrap(),
            username,
            token: body["token"].as_str().unwrap().to_string(),
        }
    }
}

/// Extracts the `id` of a created resource
pub fn id_of(body: &Value) -> i64 {
    body["id"]
        .as_i64()
        .unwrap_or_else(|| panic!("response has no id: {body}"))
}
