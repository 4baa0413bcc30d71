//! Domain errors

use thiserror::Error;

use crate::validation::FieldErrors;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not active")]
    UserNotActive,

    #[error("Cannot {action} {entity} in status {from}")]
    InvalidStateTransition {
        entity: &'static str,
        from: String,
        action: &'static str,
    },

    #[error("Business already claimed")]
    AlreadyClaimed,

    #[error("Event is full")]
    EventFull,

    #[error("Not enough tickets left")]
    SoldOut,

    #[error("Coupon unavailable: {0}")]
    CouponUnavailable(String),

    #[error("A workspace must keep at least one owner")]
    LastOwner,

    #[error("Tenant workspace limit reached ({0})")]
    WorkspaceLimitReached(i32),

    #[error("Password hash error: {0}")]
    PasswordHashError(String),

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound { entity, id: id.to_string() }
    }

    /// Single field-level validation failure.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::default();
        errors.add(field, message);
        DomainError::Validation(errors)
    }

    pub fn transition(entity: &'static str, from: impl ToString, action: &'static str) -> Self {
        DomainError::InvalidStateTransition { entity, from: from.to_string(), action }
    }
}
