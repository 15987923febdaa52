//! Session token generation and validation
//!
//! Implements stateless session tokens as HS256 JWTs. A token carries the user
//! ID and email, an issue time and an expiry; it is valid only while
//! `now < exp`. Verification is pure computation plus a clock read.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shop_core::AuthConfig;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// Claims embedded in the session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Token issuer
    pub iss: String,
    /// Subject - user ID
    pub sub: String,
    /// User's email address
    pub email: String,
    /// Issued at timestamp (Unix epoch seconds)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch seconds)
    pub exp: u64,
}

impl SessionClaims {
    /// Subject parsed as a user ID
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

/// Session token errors
///
/// Callers outside this module must treat every variant as "unauthenticated";
/// the distinction is only for logs and tests.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),

    #[error("Malformed token")]
    Malformed,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token lifetime overflows the clock")]
    LifetimeOverflow,

    #[error("System time error: {0}")]
    Clock(#[from] std::time::SystemTimeError),
}

/// Token codec configuration
///
/// Built once from [`AuthConfig`] at startup and passed explicitly, so tests can
/// use distinct secrets side by side.
#[derive(Clone)]
pub struct TokenConfig {
    /// Secret key for HMAC signing
    pub secret: String,
    /// Token lifetime in seconds
    pub ttl_secs: u64,
    /// Token issuer identifier
    pub issuer: String,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>, ttl_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs,
            issuer: "shop-api".to_string(),
        }
    }
}

impl From<&AuthConfig> for TokenConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            ttl_secs: config.token_ttl_secs,
            issuer: config.issuer.clone(),
        }
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("ttl_secs", &self.ttl_secs)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Current Unix time in seconds
pub fn unix_now() -> Result<u64, TokenError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Issue a signed session token for a user
///
/// # Example
///
/// ```no_run
/// use shop_api::auth::token::{issue_token, TokenConfig};
/// use uuid::Uuid;
///
/// let config = TokenConfig::new("0123456789abcdef0123456789abcdef", 86400);
/// let token = issue_token(&config, Uuid::new_v4(), "alice@example.com")
///     .expect("Failed to issue token");
/// ```
pub fn issue_token(config: &TokenConfig, user_id: Uuid, email: &str) -> Result<String, TokenError> {
    issue_token_at(config, user_id, email, unix_now()?)
}

/// Issue a token as if the current time were `now`
pub fn issue_token_at(
    config: &TokenConfig,
    user_id: Uuid,
    email: &str,
    now: u64,
) -> Result<String, TokenError> {
    let exp = now
        .checked_add(config.ttl_secs)
        .ok_or(TokenError::LifetimeOverflow)?;

    let claims = SessionClaims {
        iss: config.issuer.clone(),
        sub: user_id.to_string(),
        email: email.to_string(),
        iat: now,
        exp,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify a session token and extract its claims
pub fn verify_token(config: &TokenConfig, token: &str) -> Result<SessionClaims, TokenError> {
    verify_token_at(config, token, unix_now()?)
}

/// Verify a token against an explicit clock reading
///
/// Expiry is checked here rather than by `jsonwebtoken` so there is no leeway
/// and the boundary is exact: a token is rejected once `now >= exp`.
pub fn verify_token_at(
    config: &TokenConfig,
    token: &str,
    now: u64,
) -> Result<SessionClaims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_required_spec_claims(&["exp", "sub", "iss"]);
    validation.validate_exp = false;
    validation.leeway = 0;

    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    })?;

    if now >= token_data.claims.exp {
        return Err(TokenError::Expired);
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SECRET: &str = "test-secret-test-secret-test-secret!";

    fn config() -> TokenConfig {
        TokenConfig::new(SECRET, 3600)
    }

    /// Replace one character of the payload segment with a different one
    fn tamper_payload(token: &str, index: usize) -> String {
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let payload: Vec<char> = parts[1].chars().collect();
        let i = index % payload.len();
        let replacement = if payload[i] == 'A' { 'B' } else { 'A' };
        parts[1] = payload
            .iter()
            .enumerate()
            .map(|(j, c)| if j == i { replacement } else { *c })
            .collect();
        parts.join(".")
    }

    #[test]
    fn test_issue_and_verify_token() {
        let config = config();
        let user_id = Uuid::new_v4();

        let token = issue_token(&config, user_id, "test@example.com").expect("issue");
        let claims = verify_token(&config, &token).expect("verify");

        assert_eq!(claims.user_id(), Some(user_id));
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.iss, "shop-api");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expiry_boundary() {
        let config = TokenConfig::new(SECRET, 60);
        let issued_at = 1_700_000_000;
        let token = issue_token_at(&config, Uuid::new_v4(), "a@example.com", issued_at).unwrap();

        assert!(verify_token_at(&config, &token, issued_at).is_ok());
        assert!(verify_token_at(&config, &token, issued_at + 59).is_ok());
        assert!(matches!(
            verify_token_at(&config, &token, issued_at + 60),
            Err(TokenError::Expired)
        ));
        assert!(matches!(
            verify_token_at(&config, &token, issued_at + 3600),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_expired_token_with_real_clock() {
        let config = config();
        let now = unix_now().unwrap();
        let token = issue_token_at(&config, Uuid::new_v4(), "a@example.com", now - 7200).unwrap();

        assert!(matches!(
            verify_token(&config, &token),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_malformed_token() {
        let config = config();
        assert!(matches!(
            verify_token(&config, "not-a-token"),
            Err(TokenError::Malformed)
        ));
        assert!(matches!(
            verify_token(&config, ""),
            Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn test_wrong_secret() {
        let token = issue_token(
            &TokenConfig::new("secret-one-secret-one-secret-one!", 3600),
            Uuid::new_v4(),
            "a@example.com",
        )
        .unwrap();

        let result = verify_token(&TokenConfig::new("secret-two-secret-two-secret-two!", 3600), &token);
        assert!(matches!(result, Err(TokenError::InvalidSignature)));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let config = config();
        let token = issue_token(&config, Uuid::new_v4(), "a@example.com").unwrap();

        let other = TokenConfig {
            issuer: "someone-else".to_string(),
            ..config
        };
        assert!(verify_token(&other, &token).is_err());
    }

    #[test]
    fn test_huge_ttl_is_an_error() {
        let config = TokenConfig::new(SECRET, u64::MAX);
        assert!(matches!(
            issue_token_at(&config, Uuid::new_v4(), "a@example.com", 1_700_000_000),
            Err(TokenError::LifetimeOverflow)
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        assert!(!format!("{:?}", config()).contains(SECRET));
    }

    proptest! {
        #[test]
        fn prop_tampered_payload_fails_signature(
            secret in "[a-zA-Z0-9]{32,64}",
            email in "[a-z]{1,12}@[a-z]{1,8}\\.com",
            index in 0usize..512,
        ) {
            let config = TokenConfig::new(secret, 3600);
            let token = issue_token(&config, Uuid::new_v4(), &email).unwrap();
            let forged = tamper_payload(&token, index);

            prop_assert_ne!(&forged, &token);
            prop_assert!(matches!(
                verify_token(&config, &forged),
                Err(TokenError::InvalidSignature)
            ));
        }

        #[test]
        fn prop_round_trip_before_expiry(
            ttl in 1u64..1_000_000,
            offset in 0u64..1_000_000,
        ) {
            let config = TokenConfig::new(SECRET, ttl);
            let issued_at = 1_700_000_000;
            let user_id = Uuid::new_v4();
            let token = issue_token_at(&config, user_id, "p@example.com", issued_at).unwrap();

            let result = verify_token_at(&config, &token, issued_at + offset);
            if offset < ttl {
                let claims = result.unwrap();
                prop_assert_eq!(claims.user_id(), Some(user_id));
                prop_assert_eq!(claims.email.as_str(), "p@example.com");
            } else {
                prop_assert!(matches!(result, Err(TokenError::Expired)));
            }
        }
    }
}
