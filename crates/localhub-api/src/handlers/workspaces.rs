//! Workspaces and their membership.

use axum::{extract::State, http::StatusCode};
use localhub_core::{AddMember, ChangeMemberRole, NewWorkspace, Workspace, WorkspaceMember, WorkspaceUpdate};
use localhub_shared::{Page, Pagination};
use uuid::Uuid;

use crate::{
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    middleware::AuthUser,
    response::{created, ok, ApiResult, Created},
    state::AppState,
};

/// Workspaces the caller belongs to.
pub async fn list_mine(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Workspace>> {
    Ok(ok(state.workspaces.list_for_user(user_id, pagination).await?))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<NewWorkspace>,
) -> Created<Workspace> {
    Ok(created(state.workspaces.create(user_id, input).await?))
}

pub async fn get(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Workspace> {
    Ok(ok(state.workspaces.get(ws, user_id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<WorkspaceUpdate>,
) -> ApiResult<Workspace> {
    Ok(ok(state.workspaces.update(ws, user_id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    state.workspaces.delete(ws, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_members(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<WorkspaceMember>> {
    Ok(ok(state.workspaces.list_members(ws, user_id, pagination).await?))
}

pub async fn add_member(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<AddMember>,
) -> Created<WorkspaceMember> {
    Ok(created(state.workspaces.add_member(ws, user_id, input).await?))
}

pub async fn change_role(
    State(state): State<AppState>,
    ApiPath((ws, member_id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<ChangeMemberRole>,
) -> ApiResult<WorkspaceMember> {
    Ok(ok(state.workspaces.change_role(ws, user_id, member_id, input).await?))
}

pub async fn remove_member(
    State(state): State<AppState>,
    ApiPath((ws, member_id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    state.workspaces.remove_member(ws, user_id, member_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
