// ============================================================================
// LocalHub API - Bearer Token Authentication
// File: crates/localhub-api/src/middleware/auth.rs
// ============================================================================
//! Extractors that turn an `Authorization: Bearer` header into a user id.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// The authenticated caller. Rejects with 401 when the header is missing or
/// the access token does not validate.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

/// Optional caller for public reads. A missing header is anonymous; a
/// present but invalid token is still rejected.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<Uuid>);

fn bearer_token(parts: &Parts) -> Result<Option<&str>, ApiError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Malformed authorization header".into()))?;
    value
        .strip_prefix("Bearer ")
        .map(|token| Some(token.trim()))
        .ok_or_else(|| ApiError::Unauthorized("Expected a Bearer token".into()))
}

fn authenticate(token: &str, state: &AppState) -> Result<Uuid, ApiError> {
    let claims = state
        .jwt
        .validate_access_token(token)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;
    claims.user_id().map_err(|e| ApiError::Unauthorized(e.to_string()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.ok_or_else(|| ApiError::Unauthorized("Missing access token".into()))?;
        authenticate(token, state).map(AuthUser)
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => authenticate(token, state).map(|id| MaybeUser(Some(id))),
            None => Ok(MaybeUser(None)),
        }
    }
}
