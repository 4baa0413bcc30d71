//! Workspace CRM: customers, deals and the pipeline report. Members only.

use axum::{extract::State, http::StatusCode};
use localhub_core::{
    Customer, CustomerFilter, CustomerUpdate, Deal, DealFilter, DealUpdate, MoveDealStage, NewCustomer, NewDeal,
    StageSummary,
};
use localhub_shared::{Page, Pagination};
use uuid::Uuid;

use crate::{
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    middleware::AuthUser,
    response::{created, ok, ApiResult, Created},
    state::AppState,
};

pub async fn list_customers(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
    ApiQuery(filter): ApiQuery<CustomerFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Customer>> {
    Ok(ok(state.crm.list_customers(ws, user_id, filter, pagination).await?))
}

pub async fn get_customer(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Customer> {
    Ok(ok(state.crm.get_customer(ws, id, user_id).await?))
}

pub async fn create_customer(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<NewCustomer>,
) -> Created<Customer> {
    Ok(created(state.crm.create_customer(ws, user_id, input).await?))
}

pub async fn update_customer(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<CustomerUpdate>,
) -> ApiResult<Customer> {
    Ok(ok(state.crm.update_customer(ws, id, user_id, input).await?))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    state.crm.delete_customer(ws, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_deals(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
    ApiQuery(filter): ApiQuery<DealFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Deal>> {
    Ok(ok(state.crm.list_deals(ws, user_id, filter, pagination).await?))
}

pub async fn get_deal(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Deal> {
    Ok(ok(state.crm.get_deal(ws, id, user_id).await?))
}

pub async fn create_deal(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<NewDeal>,
) -> Created<Deal> {
    Ok(created(state.crm.create_deal(ws, user_id, input).await?))
}

pub async fn update_deal(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<DealUpdate>,
) -> ApiResult<Deal> {
    Ok(ok(state.crm.update_deal(ws, id, user_id, input).await?))
}

pub async fn delete_deal(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    state.crm.delete_deal(ws, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn move_stage(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<MoveDealStage>,
) -> ApiResult<Deal> {
    Ok(ok(state.crm.move_stage(ws, id, user_id, input).await?))
}

pub async fn pipeline(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Vec<StageSummary>> {
    Ok(ok(state.crm.pipeline_summary(ws, user_id).await?))
}
