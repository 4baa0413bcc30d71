//! Ticket plans under an event, purchases, and the caller's orders.

use axum::{extract::State, http::StatusCode};
use localhub_core::{NewTicketPlan, PurchaseTickets, TicketOrder, TicketPlan, TicketPlanUpdate};
use localhub_shared::{Page, Pagination};
use uuid::Uuid;

use crate::{
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    middleware::{AuthUser, MaybeUser},
    response::{created, ok, ApiResult, Created},
    state::AppState,
};

pub async fn list_plans(
    State(state): State<AppState>,
    ApiPath((ws, event_id)): ApiPath<(Uuid, Uuid)>,
    MaybeUser(viewer): MaybeUser,
) -> ApiResult<Vec<TicketPlan>> {
    Ok(ok(state.tickets.list_plans(ws, event_id, viewer).await?))
}

pub async fn create_plan(
    State(state): State<AppState>,
    ApiPath((ws, event_id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<NewTicketPlan>,
) -> Created<TicketPlan> {
    Ok(created(state.tickets.create_plan(ws, event_id, user_id, input).await?))
}

pub async fn update_plan(
    State(state): State<AppState>,
    ApiPath((ws, plan_id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<TicketPlanUpdate>,
) -> ApiResult<TicketPlan> {
    Ok(ok(state.tickets.update_plan(ws, plan_id, user_id, input).await?))
}

pub async fn delete_plan(
    State(state): State<AppState>,
    ApiPath((ws, plan_id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    state.tickets.delete_plan(ws, plan_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn purchase(
    State(state): State<AppState>,
    ApiPath((ws, plan_id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<PurchaseTickets>,
) -> Created<TicketOrder> {
    Ok(created(state.tickets.purchase(ws, plan_id, user_id, input).await?))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    ApiPath(order_id): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<TicketOrder> {
    Ok(ok(state.tickets.cancel_order(order_id, user_id).await?))
}

pub async fn my_orders(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<TicketOrder>> {
    Ok(ok(state.tickets.list_orders_for_user(user_id, pagination).await?))
}
