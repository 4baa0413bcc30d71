//! Coupons: moderation, community votes and claims.

use axum::{extract::State, http::StatusCode};
use localhub_core::{CastVote, Coupon, CouponClaim, CouponFilter, CouponUpdate, NewCoupon, RejectCoupon};
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
    ApiQuery(filter): ApiQuery<CouponFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Coupon>> {
    Ok(ok(state.coupons.list(ws, viewer, filter, pagination).await?))
}

pub async fn get(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    MaybeUser(viewer): MaybeUser,
) -> ApiResult<Coupon> {
    Ok(ok(state.coupons.get(ws, id, viewer).await?))
}

pub async fn create(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<NewCoupon>,
) -> Created<Coupon> {
    Ok(created(state.coupons.create(ws, user_id, input).await?))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<CouponUpdate>,
) -> ApiResult<Coupon> {
    Ok(ok(state.coupons.update(ws, id, user_id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    state.coupons.delete(ws, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn submit(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Coupon> {
    Ok(ok(state.coupons.submit(ws, id, user_id).await?))
}

pub async fn approve(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Coupon> {
    Ok(ok(state.coupons.approve(ws, id, user_id).await?))
}

pub async fn reject(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<RejectCoupon>,
) -> ApiResult<Coupon> {
    Ok(ok(state.coupons.reject(ws, id, user_id, input).await?))
}

pub async fn vote(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<CastVote>,
) -> ApiResult<Coupon> {
    Ok(ok(state.coupons.vote(ws, id, user_id, input).await?))
}

pub async fn claim(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
) -> Created<CouponClaim> {
    Ok(created(state.coupons.claim(ws, id, user_id).await?))
}
