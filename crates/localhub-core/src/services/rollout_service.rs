//! Percentage-based feature rollouts

use std::sync::Arc;

use chrono::{DateTime, Utc};
use localhub_shared::types::{Page, Pagination};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{NewRollout, Rollout, RolloutUpdate, WorkspaceRole};
use crate::error::DomainError;
use crate::repositories::RolloutRepository;
use crate::services::access::WorkspaceAccess;
use crate::services::scope::in_workspace;
use crate::validation::Validated;

/// Answer to "is this feature on for this subject right now".
#[derive(Debug, Clone, Serialize)]
pub struct RolloutCheck {
    pub feature_key: String,
    pub subject: String,
    pub enabled: bool,
    pub percentage: i32,
}

type Transition = fn(&mut Rollout, DateTime<Utc>) -> Result<(), DomainError>;

pub struct RolloutService {
    rollouts: Arc<dyn RolloutRepository>,
    access: WorkspaceAccess,
}

impl RolloutService {
    pub fn new(rollouts: Arc<dyn RolloutRepository>, access: WorkspaceAccess) -> Self {
        Self { rollouts, access }
    }

    pub async fn create(&self, workspace_id: Uuid, user_id: Uuid, input: NewRollout) -> Result<Rollout, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        input.check()?;

        let rollout = self.rollouts.create(&Rollout::create(workspace_id, input, user_id)).await?;
        info!(rollout_id = %rollout.id, feature_key = %rollout.feature_key, "Rollout created");
        Ok(rollout)
    }

    pub async fn get(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Rollout, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Member).await?;
        self.load(workspace_id, id).await
    }

    pub async fn list(&self, workspace_id: Uuid, user_id: Uuid, pagination: Pagination) -> Result<Page<Rollout>, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Member).await?;
        self.rollouts.list(&workspace_id, pagination).await
    }

    /// Only pending rollouts can be reconfigured.
    pub async fn update(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid, input: RolloutUpdate) -> Result<Rollout, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        input.check()?;

        let mut rollout = self.load(workspace_id, id).await?;
        rollout.apply(input)?;
        let rollout = self.rollouts.update(&rollout).await?;
        info!(rollout_id = %id, "Rollout updated");
        Ok(rollout)
    }

    pub async fn delete(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Admin).await?;
        let rollout = self.load(workspace_id, id).await?;
        if !rollout.can_delete() {
            warn!(rollout_id = %id, status = %rollout.status, "Refused to delete live rollout");
            return Err(DomainError::transition("rollout", rollout.status, "delete"));
        }
        self.rollouts.delete(&id).await?;
        info!(rollout_id = %id, "Rollout deleted");
        Ok(())
    }

    pub async fn start(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Rollout, DomainError> {
        self.transition(workspace_id, id, user_id, "start", Rollout::start).await
    }

    pub async fn pause(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Rollout, DomainError> {
        self.transition(workspace_id, id, user_id, "pause", Rollout::pause).await
    }

    pub async fn resume(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Rollout, DomainError> {
        self.transition(workspace_id, id, user_id, "resume", Rollout::resume).await
    }

    pub async fn advance(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Rollout, DomainError> {
        self.transition(workspace_id, id, user_id, "advance", Rollout::advance).await
    }

    pub async fn complete(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Rollout, DomainError> {
        self.transition(workspace_id, id, user_id, "complete", Rollout::complete).await
    }

    pub async fn cancel(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Rollout, DomainError> {
        self.transition(workspace_id, id, user_id, "cancel", Rollout::cancel).await
    }

    pub async fn check(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid, subject: &str) -> Result<RolloutCheck, DomainError> {
        let rollout = self.get(workspace_id, id, user_id).await?;
        Ok(RolloutCheck {
            enabled: rollout.is_enabled_for(subject),
            feature_key: rollout.feature_key,
            subject: subject.to_string(),
            percentage: rollout.current_percentage,
        })
    }

    async fn transition(
        &self,
        workspace_id: Uuid,
        id: Uuid,
        user_id: Uuid,
        action: &'static str,
        apply: Transition,
    ) -> Result<Rollout, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        let mut rollout = self.load(workspace_id, id).await?;
        apply(&mut rollout, Utc::now())?;
        let rollout = self.rollouts.update(&rollout).await?;
        info!(
            rollout_id = %id,
            action,
            status = %rollout.status,
            percentage = rollout.current_percentage,
            "Rollout transitioned"
        );
        Ok(rollout)
    }

    async fn load(&self, workspace_id: Uuid, id: Uuid) -> Result<Rollout, DomainError> {
        in_workspace(self.rollouts.find_by_id(&id).await?, workspace_id, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RolloutStatus;
    use crate::repositories::MockRolloutRepository;
    use crate::services::testing::access;

    fn rollout(workspace_id: Uuid) -> Rollout {
        Rollout::create(
            workspace_id,
            NewRollout {
                name: "New event map".into(),
                feature_key: "events.map".into(),
                description: None,
                target_percentage: 50,
                step_percentage: 20,
            },
            Uuid::new_v4(),
        )
    }

    fn service_with(rollout: Rollout, role: WorkspaceRole) -> RolloutService {
        let mut rollouts = MockRolloutRepository::new();
        rollouts.expect_find_by_id().returning(move |_| Ok(Some(rollout.clone())));
        rollouts.expect_update().returning(|r| Ok(r.clone()));
        RolloutService::new(Arc::new(rollouts), access(Some(role)))
    }

    #[tokio::test]
    async fn test_start_then_advance_to_target() {
        let ws = Uuid::new_v4();
        let mut pending = rollout(ws);
        let id = pending.id;

        let started = service_with(pending.clone(), WorkspaceRole::Editor)
            .start(ws, id, Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(started.status, RolloutStatus::Running);
        assert_eq!(started.current_percentage, 20);

        pending.start(Utc::now()).unwrap();
        pending.advance(Utc::now()).unwrap();
        let finished = service_with(pending, WorkspaceRole::Editor)
            .advance(ws, id, Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(finished.current_percentage, 50);
        assert_eq!(finished.status, RolloutStatus::Completed);
    }

    #[tokio::test]
    async fn test_advance_requires_running() {
        let ws = Uuid::new_v4();
        let pending = rollout(ws);
        let id = pending.id;
        let result = service_with(pending, WorkspaceRole::Editor).advance(ws, id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(DomainError::InvalidStateTransition { .. })));
    }

    #[tokio::test]
    async fn test_running_rollout_cannot_be_deleted() {
        let ws = Uuid::new_v4();
        let mut running = rollout(ws);
        running.start(Utc::now()).unwrap();
        let id = running.id;
        let mut rollouts = MockRolloutRepository::new();
        rollouts.expect_find_by_id().returning(move |_| Ok(Some(running.clone())));
        rollouts.expect_delete().never();
        let service = RolloutService::new(Arc::new(rollouts), access(Some(WorkspaceRole::Admin)));

        let result = service.delete(ws, id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(DomainError::InvalidStateTransition { .. })));
    }

    #[tokio::test]
    async fn test_check_is_deterministic() {
        let ws = Uuid::new_v4();
        let mut running = rollout(ws);
        running.start(Utc::now()).unwrap();
        let id = running.id;
        let service = service_with(running, WorkspaceRole::Member);

        let first = service.check(ws, id, Uuid::new_v4(), "user-42").await.unwrap();
        let second = service.check(ws, id, Uuid::new_v4(), "user-42").await.unwrap();
        assert_eq!(first.enabled, second.enabled);
        assert_eq!(first.percentage, 20);
        assert_eq!(first.feature_key, "events.map");
    }
}
