//! Session tokens
//!
//! Stateless HS256 JWTs. Nothing is stored server-side and there is no
//! revocation; a token is valid as long as its signature checks out and, if
//! a lifetime is configured, it has not expired.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;
use crate::models::User;

/// Claims carried by a session token
///
/// Signup tokens carry `username` and no `isAdmin`; sign-in and Google tokens
/// carry `isAdmin` and no `username`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject user id
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "isAdmin", default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    /// Issued at (seconds since the epoch)
    pub iat: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

impl Claims {
    /// Claims for a freshly registered user
    pub fn for_signup(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: Some(user.username.clone()),
            is_admin: None,
            iat: now(),
            exp: None,
        }
    }

    /// Claims for sign-in and Google login
    pub fn for_session(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: None,
            is_admin: Some(user.is_admin),
            iat: now(),
            exp: None,
        }
    }

    /// Administrator flag; absent counts as false
    pub fn is_admin(&self) -> bool {
        self.is_admin.unwrap_or(false)
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to sign token: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),

    #[error("Invalid token")]
    Invalid,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token signature")]
    InvalidSignature,
}

/// Signing settings
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    /// Lifetime in seconds; `None` issues tokens without `exp`
    pub ttl_seconds: Option<u64>,
}

impl From<&AuthConfig> for TokenConfig {
    fn from(auth: &AuthConfig) -> Self {
        Self {
            secret: auth.jwt_secret.clone(),
            ttl_seconds: auth.token_ttl_seconds,
        }
    }
}

fn now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Sign `claims`, adding `exp` when a lifetime is configured
pub fn issue_token(config: &TokenConfig, mut claims: Claims) -> Result<String, TokenError> {
    if let Some(ttl) = config.ttl_seconds {
        claims.exp = Some(claims.iat.saturating_add(ttl));
    }

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(TokenError::Encoding)
}

/// Check the signature (and expiry, when configured) and return the claims
pub fn verify_token(config: &TokenConfig, token: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    if config.ttl_seconds.is_none() {
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
    }

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        _ => TokenError::Invalid,
    })?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TokenConfig {
        TokenConfig {
            secret: "test-secret-with-enough-length-for-hs256".to_string(),
            ttl_seconds: None,
        }
    }

    fn user(is_admin: bool) -> User {
        let mut user = User::new("anna".into(), "anna@example.com".into(), "hash".into());
        user.is_admin = is_admin;
        user
    }

    #[test]
    fn test_session_token_roundtrip() {
        let user = user(true);
        let token = issue_token(&config(), Claims::for_session(&user)).unwrap();

        let claims = verify_token(&config(), &token).unwrap();
        assert_eq!(claims.id, user.id);
        assert!(claims.is_admin());
        assert!(claims.username.is_none());
        assert!(claims.exp.is_none());
    }

    #[test]
    fn test_signup_token_has_username_but_no_admin_flag() {
        let user = user(false);
        let token = issue_token(&config(), Claims::for_signup(&user)).unwrap();

        let claims = verify_token(&config(), &token).unwrap();
        assert_eq!(claims.username.as_deref(), Some("anna"));
        assert_eq!(claims.is_admin, None);
        assert!(!claims.is_admin());
    }

    #[test]
    fn test_wire_claim_names() {
        let claims = Claims::for_session(&user(true));
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["isAdmin"], true);
        assert!(json.get("username").is_none());
        assert!(json.get("exp").is_none());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issue_token(&config(), Claims::for_session(&user(false))).unwrap();
        let other = TokenConfig {
            secret: "another-secret".to_string(),
            ttl_seconds: None,
        };

        assert!(matches!(
            verify_token(&other, &token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            verify_token(&config(), "not.a.token"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_ttl_adds_expiry() {
        let config = TokenConfig {
            ttl_seconds: Some(3600),
            ..config()
        };
        let token = issue_token(&config, Claims::for_session(&user(false))).unwrap();

        let claims = verify_token(&config, &token).unwrap();
        assert_eq!(claims.exp, Some(claims.iat + 3600));
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let config = TokenConfig {
            ttl_seconds: Some(u64::MAX),
            ..config()
        };
        let token = issue_token(&config, Claims::for_session(&user(false))).unwrap();

        let claims = verify_token(&config, &token).unwrap();
        assert_eq!(claims.exp, Some(u64::MAX));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let config = TokenConfig {
            ttl_seconds: Some(60),
            ..config()
        };
        let mut claims = Claims::for_session(&user(false));
        claims.iat -= 7200;

        let token = issue_token(&config, claims).unwrap();
        assert!(matches!(verify_token(&config, &token), Err(TokenError::Expired)));
    }
}
