//! Request authentication and throttling

pub mod auth;
pub mod rate_limit;

pub use auth::{AuthUser, MaybeUser};
pub use rate_limit::limit_auth;
