//! Rollout repository trait (port)

use async_trait::async_trait;
use localhub_shared::types::{Page, Pagination};
use uuid::Uuid;

use crate::domain::Rollout;
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait RolloutRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Rollout>, DomainError>;
    async fn list(&self, workspace_id: &Uuid, pagination: Pagination) -> Result<Page<Rollout>, DomainError>;
    async fn create(&self, rollout: &Rollout) -> Result<Rollout, DomainError>;
    async fn update(&self, rollout: &Rollout) -> Result<Rollout, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<(), DomainError>;
}
