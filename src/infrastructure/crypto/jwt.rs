//! JWT Token handling
//!
//! Tokens are HS256-signed with the raw bytes of the operator's secret file.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::Principal;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: Vec<u8>,
    /// Token expiration time in hours
    pub expiration_hours: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<Vec<u8>>, expiration_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            expiration_hours,
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_hours", &self.expiration_hours)
            .finish()
    }
}

/// JWT TokenClaims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: u64,
    pub username: String,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
    /// Expiration time (Unix timestamp). Older tokens carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl TokenClaims {
    pub fn new(user_id: u64, username: &str, config: &JwtConfig) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(config.expiration_hours);

        Self {
            user_id,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: Some(exp.timestamp()),
        }
    }
}

impl From<TokenClaims> for Principal {
    fn from(claims: TokenClaims) -> Self {
        Principal {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

/// Create a JWT token for a user
pub fn create_token(
    user_id: u64,
    username: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let token_claims = TokenClaims::new(user_id, username, config);

    encode(
        &Header::new(Algorithm::HS256),
        &token_claims,
        &EncodingKey::from_secret(&config.secret),
    )
}

/// Verify and decode a JWT token. `exp` is enforced only when present.
pub fn verify_token(
    token: &str,
    config: &JwtConfig,
) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(&config.secret),
        &validation,
    )?;

    Ok(token_data.claims)
}
