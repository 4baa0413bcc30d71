//! HTTP error mapping

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use localhub_core::{DomainError, FieldErrors};
use thiserror::Error;

use crate::response::ApiResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Too many requests")]
    RateLimited,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    /// Status, machine-readable code, public message and field errors.
    fn parts(self) -> (StatusCode, &'static str, String, Option<FieldErrors>) {
        match self {
            ApiError::Domain(err) => domain_parts(err),
            ApiError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized: {}", msg);
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg, None)
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None)
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            ApiError::RateLimited => {
                tracing::warn!("Rate limit exceeded");
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", "Too many requests".into(), None)
            }
        }
    }
}

fn domain_parts(err: DomainError) -> (StatusCode, &'static str, String, Option<FieldErrors>) {
    let message = err.to_string();
    match err {
        DomainError::Validation(fields) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION_ERROR",
            "The given data was invalid".into(),
            Some(fields),
        ),
        DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", message, None),
        DomainError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT", message, None),
        DomainError::Forbidden(_) => {
            tracing::warn!("{}", message);
            (StatusCode::FORBIDDEN, "FORBIDDEN", message, None)
        }
        DomainError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", message, None),
        DomainError::UserNotActive => (StatusCode::UNAUTHORIZED, "USER_NOT_ACTIVE", message, None),
        DomainError::TokenError(_) => {
            tracing::warn!("{}", message);
            (StatusCode::UNAUTHORIZED, "INVALID_TOKEN", "Invalid or expired token".into(), None)
        }
        DomainError::InvalidStateTransition { .. } => {
            (StatusCode::CONFLICT, "INVALID_STATE_TRANSITION", message, None)
        }
        DomainError::AlreadyClaimed => (StatusCode::CONFLICT, "ALREADY_CLAIMED", message, None),
        DomainError::EventFull => (StatusCode::CONFLICT, "EVENT_FULL", message, None),
        DomainError::SoldOut => (StatusCode::CONFLICT, "SOLD_OUT", message, None),
        DomainError::CouponUnavailable(_) => (StatusCode::CONFLICT, "COUPON_UNAVAILABLE", message, None),
        DomainError::LastOwner => (StatusCode::CONFLICT, "LAST_OWNER", message, None),
        DomainError::WorkspaceLimitReached(_) => (StatusCode::CONFLICT, "WORKSPACE_LIMIT_REACHED", message, None),
        DomainError::PasswordHashError(_) | DomainError::DatabaseError(_) | DomainError::InternalError(_) => {
            tracing::error!("{}", message);
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "Internal server error".into(), None)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, fields) = self.parts();
        (status, Json(ApiResponse::error(code, message, fields))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: DomainError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        assert_eq!(status_of(DomainError::field("name", "required")), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_of(DomainError::not_found("Business", "x")), StatusCode::NOT_FOUND);
        assert_eq!(status_of(DomainError::Conflict("slug taken".into())), StatusCode::CONFLICT);
        assert_eq!(status_of(DomainError::Forbidden("nope".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_of(DomainError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(DomainError::SoldOut), StatusCode::CONFLICT);
        assert_eq!(status_of(DomainError::transition("Post", "draft", "approve")), StatusCode::CONFLICT);
        assert_eq!(status_of(DomainError::DatabaseError("boom".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let (_, code, message, _) = ApiError::from(DomainError::DatabaseError("relation missing".into())).parts();
        assert_eq!(code, "INTERNAL_ERROR");
        assert!(!message.contains("relation"));
    }

    #[test]
    fn test_validation_keeps_fields() {
        let (status, _, _, fields) = ApiError::from(DomainError::field("email", "invalid")).parts();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(fields.is_some_and(|f| f.contains("email")));
    }

    #[test]
    fn test_rate_limited_is_429() {
        assert_eq!(ApiError::RateLimited.into_response().status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
