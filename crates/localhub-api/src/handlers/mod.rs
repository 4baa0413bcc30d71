//! HTTP handlers, one module per resource

pub mod health;
pub mod auth;
pub mod tenants;
pub mod workspaces;
pub mod regions;
pub mod businesses;
pub mod posts;
pub mod calendars;
pub mod events;
pub mod tickets;
pub mod coupons;
pub mod classifieds;
pub mod crm;
pub mod commerce;
pub mod organizations;
pub mod messaging;
pub mod rollouts;
pub mod follows;
