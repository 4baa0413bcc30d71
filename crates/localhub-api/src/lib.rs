//! # LocalHub API
//!
//! JSON HTTP surface: router, handlers, extractors, middleware and the
//! response envelope.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
