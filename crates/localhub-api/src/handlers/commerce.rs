//! Stores and their product catalogues.

use axum::{extract::State, http::StatusCode};
use localhub_core::{NewProduct, NewStore, Product, ProductUpdate, Store, StoreUpdate};
use localhub_shared::{Page, Pagination};
use uuid::Uuid;

use crate::{
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    middleware::{AuthUser, MaybeUser},
    response::{created, ok, ApiResult, Created},
    state::AppState,
};

pub async fn list_stores(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    MaybeUser(viewer): MaybeUser,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Store>> {
    Ok(ok(state.commerce.list_stores(ws, viewer, pagination).await?))
}

pub async fn get_store(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    MaybeUser(viewer): MaybeUser,
) -> ApiResult<Store> {
    Ok(ok(state.commerce.get_store(ws, id, viewer).await?))
}

pub async fn create_store(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<NewStore>,
) -> Created<Store> {
    Ok(created(state.commerce.create_store(ws, user_id, input).await?))
}

pub async fn update_store(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<StoreUpdate>,
) -> ApiResult<Store> {
    Ok(ok(state.commerce.update_store(ws, id, user_id, input).await?))
}

pub async fn delete_store(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    state.commerce.delete_store(ws, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn publish_store(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Store> {
    Ok(ok(state.commerce.publish_store(ws, id, user_id).await?))
}

pub async fn unpublish_store(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Store> {
    Ok(ok(state.commerce.unpublish_store(ws, id, user_id).await?))
}

pub async fn list_products(
    State(state): State<AppState>,
    ApiPath((ws, store_id)): ApiPath<(Uuid, Uuid)>,
    MaybeUser(viewer): MaybeUser,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Product>> {
    Ok(ok(state.commerce.list_products(ws, store_id, viewer, pagination).await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    ApiPath((ws, store_id, id)): ApiPath<(Uuid, Uuid, Uuid)>,
    MaybeUser(viewer): MaybeUser,
) -> ApiResult<Product> {
    Ok(ok(state.commerce.get_product(ws, store_id, id, viewer).await?))
}

pub async fn create_product(
    State(state): State<AppState>,
    ApiPath((ws, store_id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<NewProduct>,
) -> Created<Product> {
    Ok(created(state.commerce.create_product(ws, store_id, user_id, input).await?))
}

pub async fn update_product(
    State(state): State<AppState>,
    ApiPath((ws, store_id, id)): ApiPath<(Uuid, Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<ProductUpdate>,
) -> ApiResult<Product> {
    Ok(ok(state.commerce.update_product(ws, store_id, id, user_id, input).await?))
}

pub async fn delete_product(
    State(state): State<AppState>,
    ApiPath((ws, store_id, id)): ApiPath<(Uuid, Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    state.commerce.delete_product(ws, store_id, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
