//! # LocalHub Infrastructure
//! 
//! PostgreSQL implementations of the core repository traits (adapters).

pub mod database;

pub use database::{create_pool, run_migrations, pg_repositories};
