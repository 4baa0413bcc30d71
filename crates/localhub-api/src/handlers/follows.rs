//! Follow and unfollow for businesses, calendars and organizations, plus the
//! caller's follow list.

use axum::extract::State;
use localhub_core::{Follow, FollowQuery, FollowableKind};
use localhub_shared::{Page, Pagination};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    extract::{ApiPath, ApiQuery},
    middleware::AuthUser,
    response::{ok, ApiResult},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct FollowState {
    pub following: bool,
}

async fn set_following(
    state: &AppState,
    kind: FollowableKind,
    (ws, id): (Uuid, Uuid),
    user_id: Uuid,
    following: bool,
) -> ApiResult<FollowState> {
    if following {
        state.follows.follow(ws, kind, id, user_id).await?;
    } else {
        state.follows.unfollow(ws, kind, id, user_id).await?;
    }
    Ok(ok(FollowState { following }))
}

async fn status(state: &AppState, kind: FollowableKind, id: Uuid, user_id: Uuid) -> ApiResult<FollowState> {
    let following = state.follows.is_following(kind, id, user_id).await?;
    Ok(ok(FollowState { following }))
}

pub async fn follow_business(
    State(state): State<AppState>,
    ApiPath(path): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<FollowState> {
    set_following(&state, FollowableKind::Business, path, user_id, true).await
}

pub async fn unfollow_business(
    State(state): State<AppState>,
    ApiPath(path): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<FollowState> {
    set_following(&state, FollowableKind::Business, path, user_id, false).await
}

pub async fn business_status(
    State(state): State<AppState>,
    ApiPath((_, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<FollowState> {
    status(&state, FollowableKind::Business, id, user_id).await
}

pub async fn follow_calendar(
    State(state): State<AppState>,
    ApiPath(path): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<FollowState> {
    set_following(&state, FollowableKind::Calendar, path, user_id, true).await
}

pub async fn unfollow_calendar(
    State(state): State<AppState>,
    ApiPath(path): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<FollowState> {
    set_following(&state, FollowableKind::Calendar, path, user_id, false).await
}

pub async fn calendar_status(
    State(state): State<AppState>,
    ApiPath((_, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<FollowState> {
    status(&state, FollowableKind::Calendar, id, user_id).await
}

pub async fn follow_organization(
    State(state): State<AppState>,
    ApiPath(path): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<FollowState> {
    set_following(&state, FollowableKind::Organization, path, user_id, true).await
}

pub async fn unfollow_organization(
    State(state): State<AppState>,
    ApiPath(path): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<FollowState> {
    set_following(&state, FollowableKind::Organization, path, user_id, false).await
}

pub async fn organization_status(
    State(state): State<AppState>,
    ApiPath((_, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<FollowState> {
    status(&state, FollowableKind::Organization, id, user_id).await
}

/// GET /api/v1/me/follows?kind=
pub async fn my_follows(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiQuery(query): ApiQuery<FollowQuery>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Follow>> {
    Ok(ok(state.follows.list_followed(user_id, query.kind, pagination).await?))
}
