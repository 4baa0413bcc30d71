//! Events, RSVPs and attendee lists. Ticketing lives in `tickets`.

use axum::{extract::State, http::StatusCode};
use localhub_core::{Event, EventFilter, EventRsvp, EventUpdate, NewEvent, RsvpRequest, RsvpStatus};
use localhub_shared::{Page, Pagination};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    middleware::{AuthUser, MaybeUser},
    response::{created, ok, ApiResult, Created},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct AttendeeQuery {
    pub status: Option<RsvpStatus>,
}

/// RSVP outcome with the event's refreshed counters.
#[derive(Debug, Serialize)]
pub struct RsvpResponse {
    pub event: Event,
    pub rsvp: EventRsvp,
}

pub async fn list(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    MaybeUser(viewer): MaybeUser,
    ApiQuery(filter): ApiQuery<EventFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Event>> {
    Ok(ok(state.events.list(ws, viewer, filter, pagination).await?))
}

pub async fn get(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    MaybeUser(viewer): MaybeUser,
) -> ApiResult<Event> {
    Ok(ok(state.events.get(ws, id, viewer).await?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<NewEvent>,
) -> Created<Event> {
    Ok(created(state.events.create(ws, user_id, input).await?))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<EventUpdate>,
) -> ApiResult<Event> {
    Ok(ok(state.events.update(ws, id, user_id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    state.events.delete(ws, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn publish(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Event> {
    Ok(ok(state.events.publish(ws, id, user_id).await?))
}

pub async fn cancel(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Event> {
    Ok(ok(state.events.cancel(ws, id, user_id).await?))
}

pub async fn rsvp(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<RsvpRequest>,
) -> ApiResult<RsvpResponse> {
    let (event, rsvp) = state.events.rsvp(ws, id, user_id, input).await?;
    Ok(ok(RsvpResponse { event, rsvp }))
}

pub async fn attendees(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiQuery(query): ApiQuery<AttendeeQuery>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<EventRsvp>> {
    Ok(ok(state.events.list_attendees(ws, id, user_id, query.status, pagination).await?))
}
