/// Google OAuth sign-in
///
/// [`IdentityProvider`] is the seam the API talks to: it builds the consent
/// URL and turns an authorization code into a profile. [`GoogleOAuthClient`]
/// implements it against Google's endpoints with `reqwest`.
///
/// [`find_or_create_user`] maps a profile onto a local account: first by
/// Google ID, then by verified email (linking the accounts), otherwise by
/// creating a new user with a unique username derived from the email.

use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const SCOPES: &str = "openid email profile";

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Missing, forged or expired `state`
    #[error("Invalid OAuth state: {0}")]
    InvalidState(String),

    /// Client ID or secret not configured
    #[error("Google sign-in is not configured")]
    NotConfigured,

    /// Code exchange failed
    #[error("Failed to exchange authorization code: {0}")]
    Exchange(String),

    /// Profile lookup failed
    #[error("Failed to fetch Google profile: {0}")]
    Profile(String),
}

/// Subset of the Google userinfo response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GoogleProfile {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    #[serde(default)]
    pub verified_email: bool,
}

/// External identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Consent page URL carrying `state`
    fn authorize_url(&self, state: &str) -> Result<String, OAuthError>;

    /// Exchanges an authorization code for the user's profile
    async fn exchange_code(&self, code: &str) -> Result<GoogleProfile, OAuthError>;
}

#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

impl GoogleOAuthConfig {
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// [`IdentityProvider`] backed by Google's OAuth 2.0 endpoints
#[derive(Debug, Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    config: GoogleOAuthConfig,
}

impl GoogleOAuthClient {
    pub fn new(config: GoogleOAuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleOAuthClient {
    fn authorize_url(&self, state: &str) -> Result<String, OAuthError> {
        if !self.config.is_configured() {
            return Err(OAuthError::NotConfigured);
        }

        let url = reqwest::Url::parse_with_params(
            AUTH_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("access_type", "offline"),
                ("state", state),
            ],
        )
        .map_err(|e| OAuthError::Exchange(format!("Bad authorization URL: {}", e)))?;

        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<GoogleProfile, OAuthError> {
        if !self.config.is_configured() {
            return Err(OAuthError::NotConfigured);
        }

        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::Exchange(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OAuthError::Exchange(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::Exchange(e.to_string()))?;

        let response = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| OAuthError::Profile(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OAuthError::Profile(format!(
                "userinfo endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<GoogleProfile>()
            .await
            .map_err(|e| OAuthError::Profile(e.to_string()))
    }
}

/// Username candidate from the local part of an email
///
/// Keeps ASCII alphanumerics and `_`, pads short results and caps the
/// length so a numeric suffix still fits in 50 characters.
pub fn base_username(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let mut name: String = local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .take(40)
        .collect::<String>()
        .to_lowercase();

    if name.len() < 3 {
        name.push_str("_user");
    }
    name
}

async fn unique_username(pool: &PgPool, email: &str) -> Result<String, sqlx::Error> {
    let base = base_username(email);
    if !User::username_exists(pool, &base).await? {
        return Ok(base);
    }

    loop {
        let suffix: u32 = rand::thread_rng().gen_range(1000..1_000_000);
        let candidate = format!("{}_{}", base, suffix);
        if !User::username_exists(pool, &candidate).await? {
            return Ok(candidate);
        }
    }
}

/// Resolves a Google profile to a local user, creating one if needed
pub async fn find_or_create_user(
    pool: &PgPool,
    profile: &GoogleProfile,
) -> Result<User, sqlx::Error> {
    if let Some(user) = User::find_by_google_id(pool, &profile.id).await? {
        return Ok(user);
    }

    if profile.verified_email {
        if let Some(user) = User::find_by_email(pool, &profile.email).await? {
            return User::link_google(pool, user.id, &profile.id, profile.picture.as_deref())
                .await;
        }
    }

    let username = unique_username(pool, &profile.email).await?;

    User::create(
        pool,
        CreateUser {
            username,
            email: profile.email.clone(),
            password_hash: None,
            google_id: Some(profile.id.clone()),
            avatar_url: profile.picture.clone(),
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_username() {
        assert_eq!(base_username("Alice.Smith@example.com"), "alicesmith");
        assert_eq!(base_username("jo@example.com"), "jo_user");
        assert_eq!(base_username("a+b@example.com"), "ab_user");
        assert_eq!(base_username(&format!("{}@x.io", "z".repeat(80))).len(), 40);
    }

    #[test]
    fn test_authorize_url_carries_state() {
        let client = GoogleOAuthClient::new(GoogleOAuthConfig {
            client_id: "client-123".to_string(),
            client_secret: "shh".to_string(),
            redirect_url: "http://localhost:8080/api/auth/google/callback".to_string(),
        });

        let url = client.authorize_url("abc.def.123").unwrap();
        assert!(url.starts_with(AUTH_URL));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("state=abc.def.123"));
        assert!(url.contains("response_type=code"));
        assert!(!url.contains("shh"));
    }

    #[test]
    fn test_unconfigured_client() {
        let client = GoogleOAuthClient::new(GoogleOAuthConfig {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url: String::new(),
        });

        assert!(matches!(
            client.authorize_url("s"),
            Err(OAuthError::NotConfigured)
        ));
    }

    #[test]
    fn test_profile_verified_defaults_false() {
        let profile: GoogleProfile =
            serde_json::from_str(r#"{"id": "1", "email": "a@b.c"}"#).unwrap();
        assert!(!profile.verified_email);
        assert!(profile.picture.is_none());
    }
}
