use axum::{extract::State, http::StatusCode};
use localhub_core::{NewOrganization, Organization, OrganizationFilter, OrganizationUpdate};
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
    ApiPath(ws): ApiPath<Uuid>,
    ApiQuery(filter): ApiQuery<OrganizationFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Organization>> {
    Ok(ok(state.organizations.list(ws, filter, pagination).await?))
}

pub async fn get(State(state): State<AppState>, ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>) -> ApiResult<Organization> {
    Ok(ok(state.organizations.get(ws, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<NewOrganization>,
) -> Created<Organization> {
    Ok(created(state.organizations.create(ws, user_id, input).await?))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<OrganizationUpdate>,
) -> ApiResult<Organization> {
    Ok(ok(state.organizations.update(ws, id, user_id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    state.organizations.delete(ws, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
