/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: access and refresh tokens
/// - [`middleware`]: bearer-token middleware attaching an [`middleware::AuthContext`]
/// - [`ownership`]: the per-resource ownership gate
/// - [`google`]: Google OAuth client and account resolution
/// - [`oauth_state`]: signed, time-limited OAuth `state` values
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::auth::password::{hash_password, verify_password};
/// use taskdeck_shared::auth::jwt::issue_token_pair;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let tokens = issue_token_pair(1, "alice", "alice@example.com", "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod google;
pub mod jwt;
pub mod middleware;
pub mod oauth_state;
pub mod ownership;
pub mod password;
