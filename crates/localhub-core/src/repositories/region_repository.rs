//! Region repository trait (port)

use async_trait::async_trait;
use localhub_shared::types::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{Region, RegionFilter};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait RegionRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Region>, DomainError>;
    async fn list(&self, filter: &RegionFilter, pagination: Pagination) -> Result<Page<Region>, DomainError>;
    async fn create(&self, region: &Region) -> Result<Region, DomainError>;
    async fn update(&self, region: &Region) -> Result<Region, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<(), DomainError>;
    async fn count_children(&self, id: &Uuid) -> Result<i64, DomainError>;
    /// Ids from `ids` with no matching region.
    async fn find_missing(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, DomainError>;
}
