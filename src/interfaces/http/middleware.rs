//! Authentication middleware for Axum
//!
//! Protected routes expect a signed token in the `X-Auth` header, with or
//! without a `Bearer ` prefix. The verified caller is stored in request
//! extensions as a [`Principal`].

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use tracing::debug;

use crate::domain::Principal;
use crate::infrastructure::crypto::jwt::{verify_token, JwtConfig};

/// Header carrying the caller's token.
pub const AUTH_HEADER: &str = "x-auth";

/// Authentication error types
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
}

/// Authentication state containing the verification key
#[derive(Clone)]
pub struct AuthState {
    pub jwt_config: JwtConfig,
}

fn extract_token(header: &str) -> &str {
    let header = header.trim();
    header.strip_prefix("Bearer ").unwrap_or(header).trim()
}

/// Token authentication middleware
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTH_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(extract_token)
        .filter(|t| !t.is_empty())
        .map(String::from);
    let Some(token) = token else {
        return auth_error_response(AuthError::MissingToken);
    };

    match verify_token(&token, &auth_state.jwt_config) {
        Ok(claims) => {
            request.extensions_mut().insert(Principal::from(claims));
            next.run(request).await
        }
        Err(e) if matches!(e.kind(), JwtErrorKind::ExpiredSignature) => {
            auth_error_response(AuthError::ExpiredToken)
        }
        Err(e) => {
            debug!(error = %e, "Token rejected");
            auth_error_response(AuthError::InvalidToken)
        }
    }
}

fn auth_error_response(error: AuthError) -> Response {
    let message = match error {
        AuthError::MissingToken => "missing X-Auth token",
        AuthError::InvalidToken => "invalid token",
        AuthError::ExpiredToken => "token has expired",
    };
    (StatusCode::UNAUTHORIZED, message).into_response()
}
