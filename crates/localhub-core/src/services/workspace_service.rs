// ============================================================================
// LocalHub Core - Workspace Service
// File: crates/localhub-core/src/services/workspace_service.rs
// ============================================================================
//! Workspaces and their members

use std::sync::Arc;

use localhub_shared::types::{Page, Pagination};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    AddMember, ChangeMemberRole, NewWorkspace, Workspace, WorkspaceMember, WorkspaceRole, WorkspaceUpdate,
};
use crate::error::DomainError;
use crate::repositories::{MemberRepository, TenantRepository, UserRepository, WorkspaceRepository};
use crate::services::access::WorkspaceAccess;
use crate::validation::Validated;

pub struct WorkspaceService {
    workspaces: Arc<dyn WorkspaceRepository>,
    members: Arc<dyn MemberRepository>,
    tenants: Arc<dyn TenantRepository>,
    users: Arc<dyn UserRepository>,
    access: WorkspaceAccess,
}

impl WorkspaceService {
    pub fn new(
        workspaces: Arc<dyn WorkspaceRepository>,
        members: Arc<dyn MemberRepository>,
        tenants: Arc<dyn TenantRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        let access = WorkspaceAccess::new(members.clone());
        Self { workspaces, members, tenants, users, access }
    }

    /// The creator becomes the first owner.
    pub async fn create(&self, user_id: Uuid, input: NewWorkspace) -> Result<Workspace, DomainError> {
        input.check()?;

        // 1. Tenant must exist and be active
        let tenant = self
            .tenants
            .find_by_id(&input.tenant_id)
            .await?
            .filter(|t| t.is_active && !t.is_deleted())
            .ok_or_else(|| DomainError::field("tenant_id", "Tenant does not exist or is inactive"))?;

        // 2. Plan limit
        let count = self.workspaces.count_by_tenant(&tenant.id).await?;
        if !tenant.can_add_workspace(count) {
            warn!(tenant_id = %tenant.id, count, "Workspace limit reached");
            return Err(DomainError::WorkspaceLimitReached(tenant.max_workspaces));
        }

        // 3. Workspace and owner membership together
        let workspace = Workspace::create(input, user_id);
        let owner = WorkspaceMember::new(workspace.id, user_id, WorkspaceRole::Owner, None);
        let workspace = self.workspaces.create_with_owner(&workspace, &owner).await?;

        info!(workspace_id = %workspace.id, tenant_id = %workspace.tenant_id, "Workspace created");
        Ok(workspace)
    }

    pub async fn get(&self, id: Uuid, user_id: Uuid) -> Result<Workspace, DomainError> {
        let workspace = self.load(id).await?;
        self.access.require(id, user_id, WorkspaceRole::Member).await?;
        Ok(workspace)
    }

    pub async fn list_for_user(&self, user_id: Uuid, pagination: Pagination) -> Result<Page<Workspace>, DomainError> {
        self.workspaces.list_for_user(&user_id, pagination).await
    }

    /// Every workspace of a tenant. Only the tenant owner may see them all;
    /// members use `list_for_user`.
    pub async fn list_by_tenant(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<Page<Workspace>, DomainError> {
        let tenant = self
            .tenants
            .find_by_id(&tenant_id)
            .await?
            .filter(|t| !t.is_deleted())
            .ok_or_else(|| DomainError::not_found("tenant", tenant_id))?;
        if tenant.created_by != Some(user_id) {
            warn!(%tenant_id, %user_id, "Tenant workspace listing by non-owner");
            return Err(DomainError::Forbidden("only the tenant owner may list its workspaces".into()));
        }
        self.workspaces.list_by_tenant(&tenant_id, pagination).await
    }

    pub async fn update(&self, id: Uuid, user_id: Uuid, input: WorkspaceUpdate) -> Result<Workspace, DomainError> {
        input.check()?;
        let mut workspace = self.load(id).await?;
        self.access.require(id, user_id, WorkspaceRole::Admin).await?;
        workspace.apply(input);
        let workspace = self.workspaces.update(&workspace).await?;
        info!(workspace_id = %id, "Workspace updated");
        Ok(workspace)
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        let mut workspace = self.load(id).await?;
        self.access.require(id, user_id, WorkspaceRole::Owner).await?;
        workspace.soft_delete();
        self.workspaces.update(&workspace).await?;
        info!(workspace_id = %id, "Workspace deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------

    pub async fn list_members(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<Page<WorkspaceMember>, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Member).await?;
        self.members.list(&workspace_id, pagination).await
    }

    pub async fn add_member(
        &self,
        workspace_id: Uuid,
        actor_id: Uuid,
        input: AddMember,
    ) -> Result<WorkspaceMember, DomainError> {
        self.load(workspace_id).await?;
        let actor = self.access.require(workspace_id, actor_id, WorkspaceRole::Admin).await?;
        if input.role == WorkspaceRole::Owner && !actor.is_owner() {
            return Err(DomainError::Forbidden("only an owner may grant the owner role".into()));
        }
        if self.users.find_by_id(&input.user_id).await?.is_none() {
            return Err(DomainError::field("user_id", "User does not exist"));
        }
        if self.members.find(&workspace_id, &input.user_id).await?.is_some() {
            return Err(DomainError::Conflict("User is already a member of this workspace".into()));
        }

        let member = WorkspaceMember::new(workspace_id, input.user_id, input.role, Some(actor_id));
        let member = self.members.add(&member).await?;
        info!(%workspace_id, user_id = %member.user_id, role = %member.role, "Member added");
        Ok(member)
    }

    pub async fn change_role(
        &self,
        workspace_id: Uuid,
        actor_id: Uuid,
        member_id: Uuid,
        input: ChangeMemberRole,
    ) -> Result<WorkspaceMember, DomainError> {
        let actor = self.access.require(workspace_id, actor_id, WorkspaceRole::Admin).await?;
        let mut member = self.find_member(workspace_id, member_id).await?;

        let touches_owner = member.is_owner() || input.role == WorkspaceRole::Owner;
        if touches_owner && !actor.is_owner() {
            return Err(DomainError::Forbidden("only an owner may grant or revoke the owner role".into()));
        }
        if member.is_owner() && input.role != WorkspaceRole::Owner {
            self.ensure_not_last_owner(workspace_id).await?;
        }

        member.role = input.role;
        member.modified_at = Some(chrono::Utc::now());
        let member = self.members.update_role(&member).await?;
        info!(%workspace_id, user_id = %member_id, role = %member.role, "Member role changed");
        Ok(member)
    }

    /// Admins remove others; anyone may leave.
    pub async fn remove_member(&self, workspace_id: Uuid, actor_id: Uuid, member_id: Uuid) -> Result<(), DomainError> {
        let member = self.find_member(workspace_id, member_id).await?;
        if actor_id != member_id {
            let actor = self.access.require(workspace_id, actor_id, WorkspaceRole::Admin).await?;
            if member.is_owner() && !actor.is_owner() {
                return Err(DomainError::Forbidden("only an owner may remove an owner".into()));
            }
        }
        if member.is_owner() {
            self.ensure_not_last_owner(workspace_id).await?;
        }
        self.members.remove(&workspace_id, &member_id).await?;
        info!(%workspace_id, user_id = %member_id, "Member removed");
        Ok(())
    }

    async fn ensure_not_last_owner(&self, workspace_id: Uuid) -> Result<(), DomainError> {
        if self.members.count_owners(&workspace_id).await? <= 1 {
            warn!(%workspace_id, "Refused to drop the last owner");
            return Err(DomainError::LastOwner);
        }
        Ok(())
    }

    async fn find_member(&self, workspace_id: Uuid, user_id: Uuid) -> Result<WorkspaceMember, DomainError> {
        self.members
            .find(&workspace_id, &user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("workspace member", user_id))
    }

    async fn load(&self, id: Uuid) -> Result<Workspace, DomainError> {
        self.workspaces
            .find_by_id(&id)
            .await?
            .filter(|w| w.removed_at.is_none())
            .ok_or_else(|| DomainError::not_found("workspace", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewTenant, SubscriptionPlan, Tenant};
    use crate::repositories::{MockMemberRepository, MockTenantRepository, MockUserRepository, MockWorkspaceRepository};

    fn tenant(max_workspaces: i32) -> Tenant {
        Tenant::create(
            NewTenant {
                name: "Springfield".into(),
                slug: None,
                description: None,
                plan: SubscriptionPlan::Free,
                max_workspaces: Some(max_workspaces),
            },
            None,
        )
    }

    fn service(
        workspaces: MockWorkspaceRepository,
        members: MockMemberRepository,
        tenants: MockTenantRepository,
    ) -> WorkspaceService {
        WorkspaceService::new(
            Arc::new(workspaces),
            Arc::new(members),
            Arc::new(tenants),
            Arc::new(MockUserRepository::new()),
        )
    }

    fn new_workspace(tenant_id: Uuid) -> NewWorkspace {
        NewWorkspace { tenant_id, name: "Downtown News".into(), slug: None, description: None }
    }

    #[tokio::test]
    async fn test_create_makes_creator_owner() {
        let t = tenant(3);
        let tenant_id = t.id;
        let creator = Uuid::new_v4();

        let mut tenants = MockTenantRepository::new();
        tenants.expect_find_by_id().returning(move |_| Ok(Some(t.clone())));
        let mut workspaces = MockWorkspaceRepository::new();
        workspaces.expect_count_by_tenant().returning(|_| Ok(1));
        workspaces
            .expect_create_with_owner()
            .withf(move |ws, owner| owner.user_id == creator && owner.role == WorkspaceRole::Owner && owner.workspace_id == ws.id)
            .returning(|ws, _| Ok(ws.clone()));

        let svc = service(workspaces, MockMemberRepository::new(), tenants);
        let ws = svc.create(creator, new_workspace(tenant_id)).await.unwrap();
        assert_eq!(ws.slug, "downtown-news");
    }

    #[tokio::test]
    async fn test_tenant_workspaces_visible_to_owner_only() {
        let owner = Uuid::new_v4();
        let mut t = tenant(3);
        t.created_by = Some(owner);
        let tenant_id = t.id;

        let mut tenants = MockTenantRepository::new();
        tenants.expect_find_by_id().returning(move |_| Ok(Some(t.clone())));
        let mut workspaces = MockWorkspaceRepository::new();
        workspaces
            .expect_list_by_tenant()
            .times(1)
            .returning(|_, p| Ok(Page::new(vec![], p, 0)));

        let svc = service(workspaces, MockMemberRepository::new(), tenants);
        assert!(matches!(
            svc.list_by_tenant(tenant_id, Uuid::new_v4(), Pagination::default()).await,
            Err(DomainError::Forbidden(_))
        ));
        let page = svc.list_by_tenant(tenant_id, owner, Pagination::default()).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_create_respects_plan_limit() {
        let t = tenant(1);
        let tenant_id = t.id;
        let mut tenants = MockTenantRepository::new();
        tenants.expect_find_by_id().returning(move |_| Ok(Some(t.clone())));
        let mut workspaces = MockWorkspaceRepository::new();
        workspaces.expect_count_by_tenant().returning(|_| Ok(1));
        workspaces.expect_create_with_owner().never();

        let svc = service(workspaces, MockMemberRepository::new(), tenants);
        assert!(matches!(
            svc.create(Uuid::new_v4(), new_workspace(tenant_id)).await,
            Err(DomainError::WorkspaceLimitReached(1))
        ));
    }

    #[tokio::test]
    async fn test_last_owner_cannot_leave_or_be_demoted() {
        let ws = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let mut members = MockMemberRepository::new();
        members
            .expect_find()
            .returning(move |w, u| Ok(Some(WorkspaceMember::new(*w, *u, WorkspaceRole::Owner, None))));
        members.expect_count_owners().returning(|_| Ok(1));
        members.expect_remove().never();
        members.expect_update_role().never();

        let svc = service(MockWorkspaceRepository::new(), members, MockTenantRepository::new());
        assert!(matches!(svc.remove_member(ws, owner, owner).await, Err(DomainError::LastOwner)));
        assert!(matches!(
            svc.change_role(ws, owner, owner, ChangeMemberRole { role: WorkspaceRole::Admin }).await,
            Err(DomainError::LastOwner)
        ));
    }

    #[tokio::test]
    async fn test_admin_cannot_grant_owner() {
        let ws_entity = Workspace::create(new_workspace(Uuid::new_v4()), Uuid::new_v4());
        let ws = ws_entity.id;
        let mut workspaces = MockWorkspaceRepository::new();
        workspaces.expect_find_by_id().returning(move |_| Ok(Some(ws_entity.clone())));
        let mut members = MockMemberRepository::new();
        members
            .expect_find()
            .returning(move |w, u| Ok(Some(WorkspaceMember::new(*w, *u, WorkspaceRole::Admin, None))));
        members.expect_add().never();

        let svc = service(workspaces, members, MockTenantRepository::new());
        let result = svc
            .add_member(ws, Uuid::new_v4(), AddMember { user_id: Uuid::new_v4(), role: WorkspaceRole::Owner })
            .await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));
    }
}
