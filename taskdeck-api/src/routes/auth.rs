/// Authentication endpoints
///
/// - `POST /api/auth/register` - Register with username, email and password
/// - `POST /api/auth/login` - Login with username and password
/// - `POST /api/auth/refresh` - Exchange a refresh token for an access token
/// - `GET /api/auth/me` - Current user (authenticated)
/// - `GET /api/auth/google` - Google consent URL
/// - `GET /api/auth/google/callback` - Google redirect target
///
/// Register, login and the Google callback all hand out an access token
/// (24h) and a refresh token (30d).

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::ValidatedJson,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use taskdeck_shared::{
    auth::{
        google::find_or_create_user,
        jwt::{self, issue_token_pair},
        middleware::AuthContext,
        oauth_state, password,
    },
    models::user::{CreateUser, User},
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token pair plus the user it was issued for
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Access token (24h)
    pub token: String,

    /// Refresh token (30d)
    pub refresh_token: String,

    pub user: User,
}

/// Refresh token request
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub token: String,
}

/// Google consent URL
#[derive(Debug, Serialize)]
pub struct GoogleLoginResponse {
    pub url: String,
}

/// Query of the Google redirect
#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn auth_response(user: User, secret: &str) -> ApiResult<AuthResponse> {
    let tokens = issue_token_pair(user.id, &user.username, &user.email, secret)?;

    Ok(AuthResponse {
        token: tokens.token,
        refresh_token: tokens.refresh_token,
        user,
    })
}

/// Register a new user
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Username or email already taken
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    password::validate_password_length(&req.password).map_err(|message| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message,
        }])
    })?;

    if User::username_or_email_taken(&state.db, &req.username, &req.email).await? {
        return Err(ApiError::Conflict(
            "Username or email already exists".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.password)?;

    // A concurrent registration can still win the race; the unique index
    // turns that into a 409 through the sqlx error mapping
    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            email: req.email,
            password_hash: Some(password_hash),
            google_id: None,
            avatar_url: None,
        },
    )
    .await?;

    let response = auth_response(user, state.jwt_secret())?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with username and password
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown user, wrong password, or an account that
///   only signs in through Google
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let user = User::find_by_username(&state.db, &req.username)
        .await?
        .ok_or_else(invalid)?;

    let hash = user.password_hash.as_deref().ok_or_else(invalid)?;
    if !password::verify_password(&req.password, hash)? {
        tracing::debug!(user_id = user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    tracing::info!(user_id = user.id, "User logged in");
    Ok(Json(auth_response(user, state.jwt_secret())?))
}

/// Exchange a refresh token for a new access token
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { token }))
}

/// Current user
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(user))
}

/// Google consent URL with a signed `state`
pub async fn google_login(State(state): State<AppState>) -> ApiResult<Json<GoogleLoginResponse>> {
    let oauth_state = oauth_state::sign_state(state.jwt_secret(), Utc::now().timestamp())?;
    let url = state.identity.authorize_url(&oauth_state)?;

    Ok(Json(GoogleLoginResponse { url }))
}

/// Google redirect target
///
/// Verifies `state`, exchanges the code, resolves or creates the local
/// user, and redirects to `{FRONTEND_URL}/auth/callback` with both tokens
/// in the query string.
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<GoogleCallbackQuery>,
) -> ApiResult<Redirect> {
    if let Some(error) = query.error {
        return Err(ApiError::BadRequest(format!("Google sign-in failed: {}", error)));
    }

    let oauth_state = query
        .state
        .ok_or_else(|| ApiError::BadRequest("Missing OAuth state".to_string()))?;
    oauth_state::verify_state(state.jwt_secret(), &oauth_state, Utc::now().timestamp())?;

    let code = query
        .code
        .ok_or_else(|| ApiError::BadRequest("Missing authorization code".to_string()))?;

    let profile = state.identity.exchange_code(&code).await?;
    let user = find_or_create_user(&state.db, &profile).await?;
    let tokens = issue_token_pair(user.id, &user.username, &user.email, state.jwt_secret())?;

    tracing::info!(user_id = user.id, "User signed in with Google");

    Ok(Redirect::temporary(&format!(
        "{}/auth/callback?token={}&refresh_token={}",
        state.config.api.frontend_url.trim_end_matches('/'),
        tokens.token,
        tokens.refresh_token
    )))
}
