//! Store and product repository traits (ports)

use async_trait::async_trait;
use localhub_shared::types::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{Product, Store};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait StoreRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Store>, DomainError>;
    async fn list(&self, workspace_id: &Uuid, published_only: bool, pagination: Pagination) -> Result<Page<Store>, DomainError>;
    async fn create(&self, store: &Store) -> Result<Store, DomainError>;
    async fn update(&self, store: &Store) -> Result<Store, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<(), DomainError>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Product>, DomainError>;
    async fn list_by_store(&self, store_id: &Uuid, active_only: bool, pagination: Pagination) -> Result<Page<Product>, DomainError>;
    async fn create(&self, product: &Product) -> Result<Product, DomainError>;
    async fn update(&self, product: &Product) -> Result<Product, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<(), DomainError>;
}
