/// Signed OAuth `state` parameter
///
/// The state sent to Google is `{issued_at}.{nonce}.{mac}` where `mac` is
/// HMAC-SHA256 over `{issued_at}.{nonce}` keyed with the server secret. The
/// callback accepts it only if the MAC matches and it is younger than
/// [`STATE_TTL_SECONDS`], so no server-side session is needed.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use super::google::OAuthError;

type HmacSha256 = Hmac<Sha256>;

/// Lifetime of a state value
pub const STATE_TTL_SECONDS: i64 = 600;

/// Allowed clock skew for states issued "in the future"
const CLOCK_SKEW_SECONDS: i64 = 60;

fn mac_for(secret: &str, payload: &str) -> Result<HmacSha256, OAuthError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| OAuthError::InvalidState(format!("Bad state key: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(mac)
}

/// Issues a fresh state value at `now` (Unix seconds)
pub fn sign_state(secret: &str, now: i64) -> Result<String, OAuthError> {
    let mut nonce = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut nonce);

    let payload = format!("{}.{}", now, hex::encode(nonce));
    let tag = mac_for(secret, &payload)?.finalize().into_bytes();

    Ok(format!("{}.{}", payload, hex::encode(tag)))
}

/// Checks signature and age of a state value at `now` (Unix seconds)
pub fn verify_state(secret: &str, state: &str, now: i64) -> Result<(), OAuthError> {
    let mut parts = state.splitn(3, '.');
    let (Some(issued), Some(nonce), Some(tag)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(OAuthError::InvalidState("Malformed state".to_string()));
    };

    let issued_at: i64 = issued
        .parse()
        .map_err(|_| OAuthError::InvalidState("Malformed state".to_string()))?;
    let tag = hex::decode(tag)
        .map_err(|_| OAuthError::InvalidState("Malformed state".to_string()))?;

    mac_for(secret, &format!("{}.{}", issued, nonce))?
        .verify_slice(&tag)
        .map_err(|_| OAuthError::InvalidState("State signature mismatch".to_string()))?;

    if now - issued_at > STATE_TTL_SECONDS || issued_at - now > CLOCK_SKEW_SECONDS {
        return Err(OAuthError::InvalidState("State expired".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_sign_and_verify() {
        let state = sign_state(SECRET, 1_700_000_000).unwrap();
        assert_eq!(state.split('.').count(), 3);
        assert!(verify_state(SECRET, &state, 1_700_000_100).is_ok());
    }

    #[test]
    fn test_states_are_unique() {
        let a = sign_state(SECRET, 1_700_000_000).unwrap();
        let b = sign_state(SECRET, 1_700_000_000).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_expired_state_rejected() {
        let state = sign_state(SECRET, 1_700_000_000).unwrap();
        let later = 1_700_000_000 + STATE_TTL_SECONDS + 1;
        assert!(matches!(
            verify_state(SECRET, &state, later),
            Err(OAuthError::InvalidState(_))
        ));
    }

    #[test]
    fn test_tampered_state_rejected() {
        let state = sign_state(SECRET, 1_700_000_000).unwrap();
        let tampered = state.replacen("1700000000", "1700000500", 1);

        assert!(verify_state(SECRET, &tampered, 1_700_000_500).is_err());
        assert!(verify_state("another-secret-key-of-enough-length", &state, 1_700_000_000).is_err());
    }

    #[test]
    fn test_malformed_state_rejected() {
        for state in ["", "abc", "1.2", "x.y.z", "1.nonce.zz"] {
            assert!(verify_state(SECRET, state, 1).is_err(), "{state}");
        }
    }
}
