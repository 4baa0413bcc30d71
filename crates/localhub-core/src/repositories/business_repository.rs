//! Business repository trait (port)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use localhub_shared::types::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{Business, BusinessFilter};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait BusinessRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Business>, DomainError>;
    async fn list(&self, workspace_id: &Uuid, filter: &BusinessFilter, pagination: Pagination) -> Result<Page<Business>, DomainError>;
    async fn create(&self, business: &Business) -> Result<Business, DomainError>;
    async fn update(&self, business: &Business) -> Result<Business, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<(), DomainError>;
    /// Sets the claimant only while the business is unclaimed; `None` when
    /// someone else got there first.
    async fn claim(&self, id: &Uuid, user_id: &Uuid, at: DateTime<Utc>) -> Result<Option<Business>, DomainError>;
}
