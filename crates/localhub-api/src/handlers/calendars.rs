use axum::{extract::State, http::StatusCode};
use localhub_core::{Calendar, CalendarUpdate, NewCalendar};
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
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Calendar>> {
    Ok(ok(state.calendars.list(ws, viewer, pagination).await?))
}

pub async fn get(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    MaybeUser(viewer): MaybeUser,
) -> ApiResult<Calendar> {
    Ok(ok(state.calendars.get(ws, id, viewer).await?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<NewCalendar>,
) -> Created<Calendar> {
    Ok(created(state.calendars.create(ws, user_id, input).await?))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<CalendarUpdate>,
) -> ApiResult<Calendar> {
    Ok(ok(state.calendars.update(ws, id, user_id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    state.calendars.delete(ws, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
