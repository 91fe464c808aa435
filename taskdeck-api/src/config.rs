/// Configuration management for the API server
///
/// Loaded once at startup from environment variables (and a `.env` file in
/// development), then shared read-only through [`crate::app::AppState`].
///
/// # Environment Variables
///
/// | Variable                   | Default                                           |
/// |----------------------------|---------------------------------------------------|
/// | `DATABASE_URL`             | required                                          |
/// | `DATABASE_MAX_CONNECTIONS` | `10`                                              |
/// | `JWT_SECRET`               | required, at least 32 characters                  |
/// | `API_HOST`                 | `0.0.0.0`                                         |
/// | `PORT`                     | `8080`                                            |
/// | `FRONTEND_URL`             | `http://localhost:5173` (also the CORS origin)    |
/// | `GOOGLE_CLIENT_ID`         | empty (Google sign-in disabled)                   |
/// | `GOOGLE_CLIENT_SECRET`     | empty                                             |
/// | `GOOGLE_REDIRECT_URL`      | `http://localhost:8080/api/auth/google/callback`  |
/// | `OBJECT_STORE_URL`         | empty (uploads disabled)                          |
/// | `OBJECT_STORE_KEY`         | empty                                             |
/// | `OBJECT_STORE_BUCKET`      | `taskdeck-attachments`                            |
/// | `MAX_UPLOAD_BYTES`         | `10485760`                                        |
/// | `LOG_FORMAT`               | `pretty` (`json` for structured output)           |
///
/// # Example
///
/// ```no_run
/// use taskdeck_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use taskdeck_shared::{auth::google::GoogleOAuthConfig, storage::ObjectStoreConfig};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub google: GoogleConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Frontend origin: allowed by CORS and target of the OAuth redirect
    pub frontend_url: String,

    /// Emit logs as JSON lines
    pub json_logs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HS256 signing key, also keys the OAuth state MAC
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub url: String,
    pub api_key: String,
    pub bucket: String,

    /// Largest accepted upload body
    pub max_upload_bytes: usize,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &str, default: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var_or(name, default)
        .parse::<T>()
        .with_context(|| format!("{} has an invalid value", name))
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a numeric one does
    /// not parse, or `JWT_SECRET` is shorter than 32 characters.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        Ok(Self {
            api: ApiConfig {
                host: var_or("API_HOST", "0.0.0.0"),
                port: parse_var("PORT", "8080")?,
                frontend_url: var_or("FRONTEND_URL", "http://localhost:5173"),
                json_logs: var_or("LOG_FORMAT", "pretty").eq_ignore_ascii_case("json"),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", "10")?,
            },
            jwt: JwtConfig { secret: jwt_secret },
            google: GoogleConfig {
                client_id: var_or("GOOGLE_CLIENT_ID", ""),
                client_secret: var_or("GOOGLE_CLIENT_SECRET", ""),
                redirect_url: var_or(
                    "GOOGLE_REDIRECT_URL",
                    "http://localhost:8080/api/auth/google/callback",
                ),
            },
            storage: StorageConfig {
                url: var_or("OBJECT_STORE_URL", ""),
                api_key: var_or("OBJECT_STORE_KEY", ""),
                bucket: var_or("OBJECT_STORE_BUCKET", "taskdeck-attachments"),
                max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", "10485760")?,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn google_oauth(&self) -> GoogleOAuthConfig {
        GoogleOAuthConfig {
            client_id: self.google.client_id.clone(),
            client_secret: self.google.client_secret.clone(),
            redirect_url: self.google.redirect_url.clone(),
        }
    }

    pub fn object_store(&self) -> ObjectStoreConfig {
        ObjectStoreConfig {
            url: self.storage.url.clone(),
            api_key: self.storage.api_key.clone(),
            bucket: self.storage.bucket.clone(),
        }
    }

    /// Configuration for tests, not read from the environment
    pub fn for_tests(database_url: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                frontend_url: "http://localhost:5173".to_string(),
                json_logs: false,
            },
            database: DatabaseConfig {
                url: database_url.into(),
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            },
            google: GoogleConfig {
                client_id: String::new(),
                client_secret: String::new(),
                redirect_url: "http://localhost:8080/api/auth/google/callback".to_string(),
            },
            storage: StorageConfig {
                url: String::new(),
                api_key: String::new(),
                bucket: "taskdeck-attachments".to_string(),
                max_upload_bytes: 1024 * 1024,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        let mut config = Config::for_tests("postgresql://localhost/test");
        config.api.port = 8080;

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_derived_client_configs() {
        let config = Config::for_tests("postgresql://localhost/test");

        assert!(!config.google_oauth().is_configured());
        assert_eq!(config.object_store().bucket, "taskdeck-attachments");
    }

    #[test]
    fn test_parse_var_defaults() {
        let value: u32 = parse_var("TASKDECK_TEST_UNSET_NUMBER", "10").unwrap();
        assert_eq!(value, 10);

        let err = parse_var::<u16>("TASKDECK_TEST_UNSET_PORT", "not-a-port").unwrap_err();
        assert!(err.to_string().contains("TASKDECK_TEST_UNSET_PORT"));
    }
}
