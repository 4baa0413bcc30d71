//! Customer and deal repository traits (ports)

use async_trait::async_trait;
use localhub_shared::types::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{Customer, CustomerFilter, Deal, DealFilter, StageSummary};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Customer>, DomainError>;
    async fn list(&self, workspace_id: &Uuid, filter: &CustomerFilter, pagination: Pagination) -> Result<Page<Customer>, DomainError>;
    async fn create(&self, customer: &Customer) -> Result<Customer, DomainError>;
    async fn update(&self, customer: &Customer) -> Result<Customer, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<(), DomainError>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait DealRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Deal>, DomainError>;
    async fn list(&self, workspace_id: &Uuid, filter: &DealFilter, pagination: Pagination) -> Result<Page<Deal>, DomainError>;
    async fn create(&self, deal: &Deal) -> Result<Deal, DomainError>;
    async fn update(&self, deal: &Deal) -> Result<Deal, DomainError>;
    /// Saves a won deal and moves its customer to the `customer` lifecycle
    /// stage in one transaction. Neither write lands if the other fails.
    async fn update_won(&self, deal: &Deal) -> Result<Deal, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<(), DomainError>;
    /// Open and closed deals grouped by stage; stages without deals are omitted.
    async fn pipeline_summary(&self, workspace_id: &Uuid) -> Result<Vec<StageSummary>, DomainError>;
}
