//! Staged feature rollouts and per-subject checks.

use axum::{extract::State, http::StatusCode};
use localhub_core::services::RolloutCheck;
use localhub_core::{NewRollout, Rollout, RolloutUpdate};
use localhub_shared::{Page, Pagination};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    middleware::AuthUser,
    response::{created, ok, ApiResult, Created},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub subject: String,
}

pub async fn list(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Rollout>> {
    Ok(ok(state.rollouts.list(ws, user_id, pagination).await?))
}

pub async fn get(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Rollout> {
    Ok(ok(state.rollouts.get(ws, id, user_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<NewRollout>,
) -> Created<Rollout> {
    Ok(created(state.rollouts.create(ws, user_id, input).await?))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<RolloutUpdate>,
) -> ApiResult<Rollout> {
    Ok(ok(state.rollouts.update(ws, id, user_id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    state.rollouts.delete(ws, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn start(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Rollout> {
    Ok(ok(state.rollouts.start(ws, id, user_id).await?))
}

pub async fn pause(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Rollout> {
    Ok(ok(state.rollouts.pause(ws, id, user_id).await?))
}

pub async fn resume(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Rollout> {
    Ok(ok(state.rollouts.resume(ws, id, user_id).await?))
}

pub async fn advance(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Rollout> {
    Ok(ok(state.rollouts.advance(ws, id, user_id).await?))
}

pub async fn complete(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Rollout> {
    Ok(ok(state.rollouts.complete(ws, id, user_id).await?))
}

pub async fn cancel(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Rollout> {
    Ok(ok(state.rollouts.cancel(ws, id, user_id).await?))
}

pub async fn check(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiQuery(query): ApiQuery<CheckQuery>,
) -> ApiResult<RolloutCheck> {
    Ok(ok(state.rollouts.check(ws, id, user_id, &query.subject).await?))
}
