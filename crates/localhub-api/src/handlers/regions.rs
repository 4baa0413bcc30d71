use axum::{extract::State, http::StatusCode};
use localhub_core::{NewRegion, Region, RegionFilter, RegionUpdate};
use localhub_shared::{Page, Pagination};
use uuid::Uuid;

use crate::{
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    middleware::AuthUser,
    response::{created, ok, ApiResult, Created},
    state::AppState,
};

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<RegionFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Region>> {
    Ok(ok(state.regions.list(&filter, pagination).await?))
}

pub async fn get(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<Region> {
    Ok(ok(state.regions.get(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    ApiJson(input): ApiJson<NewRegion>,
) -> Created<Region> {
    Ok(created(state.regions.create(input).await?))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    AuthUser(_): AuthUser,
    ApiJson(input): ApiJson<RegionUpdate>,
) -> ApiResult<Region> {
    Ok(ok(state.regions.update(id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    AuthUser(_): AuthUser,
) -> Result<StatusCode, ApiError> {
    state.regions.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
