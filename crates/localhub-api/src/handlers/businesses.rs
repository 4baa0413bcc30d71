//! Business directory handlers. Follow endpoints live in `follows`.

use axum::{extract::State, http::StatusCode};
use localhub_core::{Business, BusinessFilter, BusinessUpdate, NewBusiness};
use localhub_shared::{Page, Pagination};
use uuid::Uuid;

use crate::{
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    middleware::{AuthUser, MaybeUser},
    response::{created, ok, ApiResult, Created},
    state::AppState,
};

pub async fn list(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    MaybeUser(viewer): MaybeUser,
    ApiQuery(filter): ApiQuery<BusinessFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Business>> {
    Ok(ok(state.businesses.list(ws, viewer, filter, pagination).await?))
}

pub async fn get(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    MaybeUser(viewer): MaybeUser,
) -> ApiResult<Business> {
    Ok(ok(state.businesses.get(ws, id, viewer).await?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<NewBusiness>,
) -> Created<Business> {
    Ok(created(state.businesses.create(ws, user_id, input).await?))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<BusinessUpdate>,
) -> ApiResult<Business> {
    Ok(ok(state.businesses.update(ws, id, user_id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    state.businesses.delete(ws, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn claim(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Business> {
    Ok(ok(state.businesses.claim(ws, id, user_id).await?))
}

pub async fn verify(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Business> {
    Ok(ok(state.businesses.verify(ws, id, user_id).await?))
}
