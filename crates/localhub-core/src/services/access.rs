//! Workspace role checks shared by every workspace-scoped service.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::domain::{WorkspaceMember, WorkspaceRole};
use crate::error::DomainError;
use crate::repositories::MemberRepository;

#[derive(Clone)]
pub struct WorkspaceAccess {
    members: Arc<dyn MemberRepository>,
}

impl WorkspaceAccess {
    pub fn new(members: Arc<dyn MemberRepository>) -> Self {
        Self { members }
    }

    /// Returns the membership when `user_id` holds at least `minimum` in the
    /// workspace, `Forbidden` otherwise.
    pub async fn require(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        minimum: WorkspaceRole,
    ) -> Result<WorkspaceMember, DomainError> {
        match self.members.find(&workspace_id, &user_id).await? {
            Some(member) if member.role.at_least(minimum) => Ok(member),
            Some(member) => {
                warn!(%workspace_id, %user_id, role = %member.role, required = %minimum, "Insufficient workspace role");
                Err(DomainError::Forbidden(format!("requires the {} role", minimum)))
            }
            None => {
                warn!(%workspace_id, %user_id, "Not a workspace member");
                Err(DomainError::Forbidden("not a member of this workspace".into()))
            }
        }
    }

    pub async fn role_of(&self, workspace_id: Uuid, user_id: Uuid) -> Result<Option<WorkspaceRole>, DomainError> {
        Ok(self.members.find(&workspace_id, &user_id).await?.map(|m| m.role))
    }

    /// Whether an optional viewer may see unpublished content.
    pub async fn can_moderate(&self, workspace_id: Uuid, viewer: Option<Uuid>) -> Result<bool, DomainError> {
        match viewer {
            Some(user_id) => Ok(self
                .role_of(workspace_id, user_id)
                .await?
                .is_some_and(|role| role.at_least(WorkspaceRole::Editor))),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MockMemberRepository;

    fn access_with(role: Option<WorkspaceRole>) -> WorkspaceAccess {
        let mut members = MockMemberRepository::new();
        members
            .expect_find()
            .returning(move |ws, user| Ok(role.map(|r| WorkspaceMember::new(*ws, *user, r, None))));
        WorkspaceAccess::new(Arc::new(members))
    }

    #[tokio::test]
    async fn test_require_role() {
        let (ws, user) = (Uuid::new_v4(), Uuid::new_v4());
        assert!(access_with(Some(WorkspaceRole::Admin)).require(ws, user, WorkspaceRole::Editor).await.is_ok());
        assert!(matches!(
            access_with(Some(WorkspaceRole::Member)).require(ws, user, WorkspaceRole::Editor).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            access_with(None).require(ws, user, WorkspaceRole::Member).await,
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_can_moderate() {
        let ws = Uuid::new_v4();
        assert!(!access_with(None).can_moderate(ws, None).await.unwrap());
        assert!(!access_with(Some(WorkspaceRole::Member)).can_moderate(ws, Some(Uuid::new_v4())).await.unwrap());
        assert!(access_with(Some(WorkspaceRole::Editor)).can_moderate(ws, Some(Uuid::new_v4())).await.unwrap());
    }
}
