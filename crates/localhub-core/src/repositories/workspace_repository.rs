//! Workspace and membership repository traits (ports)

use async_trait::async_trait;
use localhub_shared::types::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{Workspace, WorkspaceMember};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Workspace>, DomainError>;
    async fn count_by_tenant(&self, tenant_id: &Uuid) -> Result<i64, DomainError>;
    async fn list_by_tenant(&self, tenant_id: &Uuid, pagination: Pagination) -> Result<Page<Workspace>, DomainError>;
    async fn list_for_user(&self, user_id: &Uuid, pagination: Pagination) -> Result<Page<Workspace>, DomainError>;
    /// Inserts the workspace and its first owner in one transaction.
    async fn create_with_owner(&self, workspace: &Workspace, owner: &WorkspaceMember) -> Result<Workspace, DomainError>;
    async fn update(&self, workspace: &Workspace) -> Result<Workspace, DomainError>;
}

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn find(&self, workspace_id: &Uuid, user_id: &Uuid) -> Result<Option<WorkspaceMember>, DomainError>;
    async fn list(&self, workspace_id: &Uuid, pagination: Pagination) -> Result<Page<WorkspaceMember>, DomainError>;
    async fn add(&self, member: &WorkspaceMember) -> Result<WorkspaceMember, DomainError>;
    async fn update_role(&self, member: &WorkspaceMember) -> Result<WorkspaceMember, DomainError>;
    async fn remove(&self, workspace_id: &Uuid, user_id: &Uuid) -> Result<(), DomainError>;
    async fn count_owners(&self, workspace_id: &Uuid) -> Result<i64, DomainError>;
    /// Ids from `user_ids` that are not members of the workspace.
    async fn find_non_members(&self, workspace_id: &Uuid, user_ids: &[Uuid]) -> Result<Vec<Uuid>, DomainError>;
}
