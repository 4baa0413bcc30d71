use axum::{extract::State, http::StatusCode};
use localhub_core::{NewTenant, Tenant, TenantUpdate, Workspace};
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
    AuthUser(_): AuthUser,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Tenant>> {
    Ok(ok(state.tenants.list(pagination).await?))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<NewTenant>,
) -> Created<Tenant> {
    Ok(created(state.tenants.create(user_id, input).await?))
}

pub async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    AuthUser(_): AuthUser,
) -> ApiResult<Tenant> {
    Ok(ok(state.tenants.get(id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<TenantUpdate>,
) -> ApiResult<Tenant> {
    Ok(ok(state.tenants.update(id, user_id, input).await?))
}

/// Tenants are deactivated, never removed.
pub async fn deactivate(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    state.tenants.deactivate(id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn workspaces(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Workspace>> {
    Ok(ok(state.workspaces.list_by_tenant(id, user_id, pagination).await?))
}
