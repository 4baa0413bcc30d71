//! Classified repository trait (port)

use async_trait::async_trait;
use localhub_shared::types::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{Classified, ClassifiedFilter};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ClassifiedRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Classified>, DomainError>;
    async fn list(&self, workspace_id: &Uuid, filter: &ClassifiedFilter, pagination: Pagination) -> Result<Page<Classified>, DomainError>;
    async fn create(&self, classified: &Classified) -> Result<Classified, DomainError>;
    async fn update(&self, classified: &Classified) -> Result<Classified, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<(), DomainError>;
}
