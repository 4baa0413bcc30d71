//! Organization repository trait (port)

use async_trait::async_trait;
use localhub_shared::types::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{Organization, OrganizationFilter};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Organization>, DomainError>;
    async fn list(&self, workspace_id: &Uuid, filter: &OrganizationFilter, pagination: Pagination) -> Result<Page<Organization>, DomainError>;
    async fn create(&self, organization: &Organization) -> Result<Organization, DomainError>;
    async fn update(&self, organization: &Organization) -> Result<Organization, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<(), DomainError>;
}
