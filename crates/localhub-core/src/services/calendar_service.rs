//! Calendars

use std::sync::Arc;

use localhub_shared::types::{Page, Pagination};
use tracing::info;
use uuid::Uuid;

use crate::domain::{Calendar, CalendarUpdate, NewCalendar, WorkspaceRole};
use crate::error::DomainError;
use crate::repositories::CalendarRepository;
use crate::services::access::WorkspaceAccess;
use crate::services::scope::in_workspace;
use crate::validation::Validated;

pub struct CalendarService {
    calendars: Arc<dyn CalendarRepository>,
    access: WorkspaceAccess,
}

impl CalendarService {
    pub fn new(calendars: Arc<dyn CalendarRepository>, access: WorkspaceAccess) -> Self {
        Self { calendars, access }
    }

    pub async fn create(&self, workspace_id: Uuid, user_id: Uuid, input: NewCalendar) -> Result<Calendar, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        input.check()?;
        let calendar = self.calendars.create(&Calendar::create(workspace_id, input, user_id)).await?;
        info!(calendar_id = %calendar.id, %workspace_id, "Calendar created");
        Ok(calendar)
    }

    /// Private calendars are visible to workspace members only.
    pub async fn get(&self, workspace_id: Uuid, id: Uuid, viewer: Option<Uuid>) -> Result<Calendar, DomainError> {
        let calendar = self.load(workspace_id, id).await?;
        if calendar.is_public || self.is_member(workspace_id, viewer).await? {
            Ok(calendar)
        } else {
            Err(DomainError::not_found("calendar", id))
        }
    }

    pub async fn list(
        &self,
        workspace_id: Uuid,
        viewer: Option<Uuid>,
        pagination: Pagination,
    ) -> Result<Page<Calendar>, DomainError> {
        let public_only = !self.is_member(workspace_id, viewer).await?;
        self.calendars.list(&workspace_id, public_only, pagination).await
    }

    pub async fn update(
        &self,
        workspace_id: Uuid,
        id: Uuid,
        user_id: Uuid,
        input: CalendarUpdate,
    ) -> Result<Calendar, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        input.check()?;
        let mut calendar = self.load(workspace_id, id).await?;
        calendar.apply(input);
        self.calendars.update(&calendar).await
    }

    pub async fn delete(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        self.load(workspace_id, id).await?;
        self.calendars.delete(&id).await?;
        info!(calendar_id = %id, "Calendar deleted");
        Ok(())
    }

    async fn is_member(&self, workspace_id: Uuid, viewer: Option<Uuid>) -> Result<bool, DomainError> {
        match viewer {
            Some(user_id) => Ok(self.access.role_of(workspace_id, user_id).await?.is_some()),
            None => Ok(false),
        }
    }

    async fn load(&self, workspace_id: Uuid, id: Uuid) -> Result<Calendar, DomainError> {
        in_workspace(self.calendars.find_by_id(&id).await?, workspace_id, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MockCalendarRepository;
    use crate::services::testing::access;

    #[tokio::test]
    async fn test_private_calendar_hidden_from_outsiders() {
        let ws = Uuid::new_v4();
        let calendar = Calendar::create(
            ws,
            NewCalendar { name: "Board meetings".into(), description: None, is_public: false },
            Uuid::new_v4(),
        );
        let id = calendar.id;
        let mut repo = MockCalendarRepository::new();
        repo.expect_find_by_id().returning(move |_| Ok(Some(calendar.clone())));
        let repo = Arc::new(repo);

        let outsider = CalendarService::new(repo.clone(), access(None));
        assert!(outsider.get(ws, id, Some(Uuid::new_v4())).await.is_err());

        let member = CalendarService::new(repo, access(Some(WorkspaceRole::Member)));
        assert!(member.get(ws, id, Some(Uuid::new_v4())).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_public_only_for_anonymous() {
        let mut repo = MockCalendarRepository::new();
        repo.expect_list()
            .withf(|_, public_only, _| *public_only)
            .returning(|_, _, p| Ok(Page::empty(p)));
        let service = CalendarService::new(Arc::new(repo), access(None));
        assert!(service.list(Uuid::new_v4(), None, Pagination::default()).await.is_ok());
    }
}
