// ============================================================================
// LocalHub API - Auth Handlers
// File: crates/localhub-api/src/handlers/auth.rs
// ============================================================================
//! Registration, login, token refresh and the current user.

use axum::extract::State;
use localhub_core::services::AuthSession;
use localhub_core::{LoginUser, RegisterUser, User};
use localhub_security::TokenPair;
use serde::Deserialize;

use crate::{
    extract::ApiJson,
    middleware::AuthUser,
    response::{created, ok, ApiResult, Created},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /api/v1/auth/register
pub async fn register(State(state): State<AppState>, ApiJson(input): ApiJson<RegisterUser>) -> Created<User> {
    let user = state.auth.register(input).await?;
    Ok(created(user))
}

/// POST /api/v1/auth/login
pub async fn login(State(state): State<AppState>, ApiJson(input): ApiJson<LoginUser>) -> ApiResult<AuthSession> {
    Ok(ok(state.auth.login(input).await?))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(State(state): State<AppState>, ApiJson(input): ApiJson<RefreshRequest>) -> ApiResult<TokenPair> {
    Ok(ok(state.auth.refresh(&input.refresh_token).await?))
}

/// GET /api/v1/auth/me
pub async fn me(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> ApiResult<User> {
    Ok(ok(state.auth.me(user_id).await?))
}
