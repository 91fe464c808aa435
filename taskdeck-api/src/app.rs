/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use taskdeck_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let app = build_router(AppState::new(pool, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use std::{convert::Infallible, sync::Arc};
use taskdeck_shared::{
    auth::{
        google::{GoogleOAuthClient, IdentityProvider},
        middleware::authenticate,
    },
    storage::{HttpObjectStore, ObjectStore},
};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler. Holds only immutable configuration and
/// clients; per-request identity travels in request extensions.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Attachment blob store
    pub store: Arc<dyn ObjectStore>,

    /// Google sign-in
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Creates state with the HTTP object store and Google client from config
    pub fn new(db: PgPool, config: Config) -> Self {
        let store = Arc::new(HttpObjectStore::new(config.object_store()));
        let identity = Arc::new(GoogleOAuthClient::new(config.google_oauth()));

        Self {
            db,
            config: Arc::new(config),
            store,
            identity,
        }
    }

    /// Replaces the object store
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = store;
        self
    }

    /// Replaces the identity provider
    pub fn with_identity_provider(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = identity;
        self
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /health                                  GET     public
/// /api/auth/{register,login,refresh}       POST    public
/// /api/auth/google[/callback]              GET     public
/// /api/auth/me                             GET
/// /api/projects[/:id]                      CRUD
/// /api/projects/:id/{boards,labels}        POST GET
/// /api/boards/:id                          PUT DELETE
/// /api/boards/:id/tasks                    POST GET
/// /api/tasks/:id                           GET PUT DELETE
/// /api/tasks/:id/move                      PATCH
/// /api/tasks/:id/history                   GET
/// /api/tasks/:id/{comments,attachments}    POST GET
/// /api/{labels,comments}/:id               PUT DELETE
/// /api/attachments/:id                     DELETE
/// ```
///
/// Everything not marked public requires a bearer access token.
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/google", get(routes::auth::google_login))
        .route("/google/callback", get(routes::auth::google_callback));

    let upload_limit = state.config.storage.max_upload_bytes;

    let protected_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        // Projects
        .route(
            "/projects",
            post(routes::projects::create_project).get(routes::projects::list_projects),
        )
        .route(
            "/projects/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        // Boards
        .route(
            "/projects/:id/boards",
            post(routes::boards::create_board).get(routes::boards::list_boards),
        )
        .route(
            "/boards/:id",
            put(routes::boards::update_board).delete(routes::boards::delete_board),
        )
        // Tasks
        .route(
            "/boards/:id/tasks",
            post(routes::tasks::create_task).get(routes::tasks::list_board_tasks),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/tasks/:id/move", patch(routes::tasks::move_task))
        .route("/tasks/:id/history", get(routes::tasks::task_history))
        // Labels
        .route(
            "/projects/:id/labels",
            post(routes::labels::create_label).get(routes::labels::list_labels),
        )
        .route(
            "/labels/:id",
            put(routes::labels::update_label).delete(routes::labels::delete_label),
        )
        // Comments
        .route(
            "/tasks/:id/comments",
            post(routes::comments::create_comment).get(routes::comments::list_comments),
        )
        .route(
            "/comments/:id",
            put(routes::comments::update_comment).delete(routes::comments::delete_comment),
        )
        // Attachments
        .route(
            "/tasks/:id/attachments",
            post(routes::attachments::upload_attachment)
                .layer::<_, Infallible>(DefaultBodyLimit::disable())
                .layer::<_, Infallible>(RequestBodyLimitLayer::new(upload_limit))
                .get(routes::attachments::list_attachments),
        )
        .route(
            "/attachments/:id",
            axum::routing::delete(routes::attachments::delete_attachment),
        )
        .layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    let api_routes = Router::new()
        .nest("/auth", public_auth_routes)
        .merge(protected_routes);

    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .api
                .frontend_url
                .parse::<HeaderValue>()
                .map(Into::into)
                .unwrap_or_else(|_| tower_http::cors::AllowOrigin::list([])),
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600));

    let hsts = state.config.api.frontend_url.starts_with("https://");

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(hsts))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer access token and injects the resulting
/// `AuthContext` into request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret())?;

    tracing::debug!(user_id = auth_context.user_id, "Request authenticated");
    req.extensions_mut().insert(auth_context);
    Ok(next.run(req).await)
}
