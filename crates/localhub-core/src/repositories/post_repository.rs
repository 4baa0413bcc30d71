//! Post repository trait (port)

use async_trait::async_trait;
use localhub_shared::types::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{Post, PostFilter};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Post>, DomainError>;
    async fn list(&self, workspace_id: &Uuid, filter: &PostFilter, pagination: Pagination) -> Result<Page<Post>, DomainError>;
    async fn create(&self, post: &Post) -> Result<Post, DomainError>;
    async fn update(&self, post: &Post) -> Result<Post, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<(), DomainError>;
}
