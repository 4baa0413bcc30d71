use axum::{extract::State, http::StatusCode};
use localhub_core::{Classified, ClassifiedFilter, ClassifiedUpdate, NewClassified, RejectClassified};
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
    ApiQuery(filter): ApiQuery<ClassifiedFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Classified>> {
    Ok(ok(state.classifieds.list(ws, viewer, filter, pagination).await?))
}

pub async fn get(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    MaybeUser(viewer): MaybeUser,
) -> ApiResult<Classified> {
    Ok(ok(state.classifieds.get(ws, id, viewer).await?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<NewClassified>,
) -> Created<Classified> {
    Ok(created(state.classifieds.create(ws, user_id, input).await?))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<ClassifiedUpdate>,
) -> ApiResult<Classified> {
    Ok(ok(state.classifieds.update(ws, id, user_id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    state.classifieds.delete(ws, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_sold(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Classified> {
    Ok(ok(state.classifieds.mark_sold(ws, id, user_id).await?))
}

pub async fn approve(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Classified> {
    Ok(ok(state.classifieds.approve(ws, id, user_id).await?))
}

pub async fn reject(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<RejectClassified>,
) -> ApiResult<Classified> {
    Ok(ok(state.classifieds.reject(ws, id, user_id, input).await?))
}
