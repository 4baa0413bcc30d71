//! Following businesses, calendars and organizations

use std::sync::Arc;

use localhub_shared::types::{Page, Pagination};
use tracing::info;
use uuid::Uuid;

use crate::domain::{Follow, FollowableKind};
use crate::error::DomainError;
use crate::repositories::{BusinessRepository, CalendarRepository, FollowRepository, OrganizationRepository};
use crate::services::access::WorkspaceAccess;
use crate::services::scope::in_workspace;

pub struct FollowService {
    follows: Arc<dyn FollowRepository>,
    businesses: Arc<dyn BusinessRepository>,
    calendars: Arc<dyn CalendarRepository>,
    organizations: Arc<dyn OrganizationRepository>,
    access: WorkspaceAccess,
}

impl FollowService {
    pub fn new(
        follows: Arc<dyn FollowRepository>,
        businesses: Arc<dyn BusinessRepository>,
        calendars: Arc<dyn CalendarRepository>,
        organizations: Arc<dyn OrganizationRepository>,
        access: WorkspaceAccess,
    ) -> Self {
        Self { follows, businesses, calendars, organizations, access }
    }

    /// Idempotent; following twice leaves a single follow.
    pub async fn follow(&self, workspace_id: Uuid, kind: FollowableKind, target_id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        self.ensure_target(workspace_id, kind, target_id, user_id).await?;
        if self.follows.follow(&Follow::new(user_id, kind, target_id)).await? {
            info!(%user_id, %kind, %target_id, "Followed");
        }
        Ok(())
    }

    /// Idempotent; unfollowing something not followed is not an error.
    pub async fn unfollow(&self, workspace_id: Uuid, kind: FollowableKind, target_id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        self.ensure_target(workspace_id, kind, target_id, user_id).await?;
        if self.follows.unfollow(&user_id, kind, &target_id).await? {
            info!(%user_id, %kind, %target_id, "Unfollowed");
        }
        Ok(())
    }

    pub async fn is_following(&self, kind: FollowableKind, target_id: Uuid, user_id: Uuid) -> Result<bool, DomainError> {
        self.follows.is_following(&user_id, kind, &target_id).await
    }

    pub async fn list_followed(
        &self,
        user_id: Uuid,
        kind: Option<FollowableKind>,
        pagination: Pagination,
    ) -> Result<Page<Follow>, DomainError> {
        self.follows.list_for_user(&user_id, kind, pagination).await
    }

    /// The target must live in the workspace and be visible to the user.
    async fn ensure_target(
        &self,
        workspace_id: Uuid,
        kind: FollowableKind,
        target_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), DomainError> {
        match kind {
            FollowableKind::Business => {
                let business = in_workspace(self.businesses.find_by_id(&target_id).await?, workspace_id, target_id)?;
                if !business.is_public() && !self.access.can_moderate(workspace_id, Some(user_id)).await? {
                    return Err(DomainError::not_found("business", target_id));
                }
            }
            FollowableKind::Calendar => {
                let calendar = in_workspace(self.calendars.find_by_id(&target_id).await?, workspace_id, target_id)?;
                if !calendar.is_public && self.access.role_of(workspace_id, user_id).await?.is_none() {
                    return Err(DomainError::not_found("calendar", target_id));
                }
            }
            FollowableKind::Organization => {
                in_workspace(self.organizations.find_by_id(&target_id).await?, workspace_id, target_id)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Calendar, NewCalendar};
    use crate::repositories::{
        MockBusinessRepository, MockCalendarRepository, MockFollowRepository, MockOrganizationRepository,
    };
    use crate::services::testing::access;

    fn calendar(workspace_id: Uuid, is_public: bool) -> Calendar {
        Calendar::create(
            workspace_id,
            NewCalendar { name: "Library events".into(), description: None, is_public },
            Uuid::new_v4(),
        )
    }

    fn service(follows: MockFollowRepository, calendar: Calendar, member: bool) -> FollowService {
        let mut calendars = MockCalendarRepository::new();
        calendars.expect_find_by_id().returning(move |_| Ok(Some(calendar.clone())));
        FollowService::new(
            Arc::new(follows),
            Arc::new(MockBusinessRepository::new()),
            Arc::new(calendars),
            Arc::new(MockOrganizationRepository::new()),
            access(member.then_some(crate::domain::WorkspaceRole::Member)),
        )
    }

    #[tokio::test]
    async fn test_follow_is_idempotent() {
        let ws = Uuid::new_v4();
        let target = calendar(ws, true);
        let id = target.id;
        let mut follows = MockFollowRepository::new();
        let mut seq = mockall::Sequence::new();
        follows.expect_follow().times(1).in_sequence(&mut seq).returning(|_| Ok(true));
        follows.expect_follow().times(1).in_sequence(&mut seq).returning(|_| Ok(false));
        let service = service(follows, target, false);

        let user = Uuid::new_v4();
        service.follow(ws, FollowableKind::Calendar, id, user).await.unwrap();
        service.follow(ws, FollowableKind::Calendar, id, user).await.unwrap();
    }

    #[tokio::test]
    async fn test_private_calendar_needs_membership() {
        let ws = Uuid::new_v4();
        let target = calendar(ws, false);
        let id = target.id;
        let mut follows = MockFollowRepository::new();
        follows.expect_follow().never();

        let result = service(follows, target, false)
            .follow(ws, FollowableKind::Calendar, id, Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_target_in_other_workspace_not_found() {
        let target = calendar(Uuid::new_v4(), true);
        let id = target.id;
        let mut follows = MockFollowRepository::new();
        follows.expect_unfollow().never();

        let result = service(follows, target, true)
            .unfollow(Uuid::new_v4(), FollowableKind::Calendar, id, Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}
