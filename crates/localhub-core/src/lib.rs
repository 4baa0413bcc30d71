//! # LocalHub Core
//! 
//! Domain entities, validation rules, services, and repository traits for the
//! LocalHub community platform.

pub mod domain;
pub mod services;
pub mod repositories;
pub mod validation;
pub mod error;

// Re-export domain entities
pub use domain::*;
pub use error::DomainError;
pub use validation::{FieldErrors, Validated};
