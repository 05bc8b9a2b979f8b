//! Caller identity from bearer tokens.

mod jwt;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use thiserror::Error;
use uuid::Uuid;

pub use jwt::JwtKeys;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AuthError::Unauthorized("Missing Authorization header".to_string()))?;
    let auth_value = auth_header
        .to_str()
        .map_err(|_| AuthError::Unauthorized("Invalid Authorization header".to_string()))?;
    auth_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::Unauthorized("Authorization must be Bearer token".to_string()))
}

/// Resolve the authenticated caller.
pub fn current_user(keys: &JwtKeys, headers: &HeaderMap) -> Result<Uuid, AuthError> {
    let token = extract_bearer_token(headers)?;
    keys.verify_user_jwt(token)
}
