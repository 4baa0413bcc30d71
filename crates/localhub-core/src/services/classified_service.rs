//! Classified listings posted by residents

use std::sync::Arc;

use chrono::Utc;
use localhub_shared::types::{Page, Pagination};
use tracing::info;
use uuid::Uuid;

use crate::domain::{
    Classified, ClassifiedFilter, ClassifiedStatus, ClassifiedUpdate, NewClassified, RejectClassified, WorkspaceRole,
};
use crate::error::DomainError;
use crate::repositories::{ClassifiedRepository, RegionRepository};
use crate::services::access::WorkspaceAccess;
use crate::services::region_service::check_region_refs;
use crate::services::scope::in_workspace;
use crate::validation::Validated;

pub struct ClassifiedService {
    classifieds: Arc<dyn ClassifiedRepository>,
    regions: Arc<dyn RegionRepository>,
    access: WorkspaceAccess,
}

impl ClassifiedService {
    pub fn new(
        classifieds: Arc<dyn ClassifiedRepository>,
        regions: Arc<dyn RegionRepository>,
        access: WorkspaceAccess,
    ) -> Self {
        Self { classifieds, regions, access }
    }

    /// Open to any signed-in user; listings wait for review before going live.
    pub async fn create(&self, workspace_id: Uuid, user_id: Uuid, input: NewClassified) -> Result<Classified, DomainError> {
        let mut errors = input.field_errors();
        check_region_refs(self.regions.as_ref(), &input.region_ids, &mut errors).await?;
        errors.into_result()?;

        let classified = self
            .classifieds
            .create(&Classified::create(workspace_id, input, user_id))
            .await?;
        info!(classified_id = %classified.id, %workspace_id, %user_id, "Classified submitted");
        Ok(classified)
    }

    pub async fn get(&self, workspace_id: Uuid, id: Uuid, viewer: Option<Uuid>) -> Result<Classified, DomainError> {
        let classified = self.load(workspace_id, id).await?;
        if classified.is_public(Utc::now())
            || viewer == Some(classified.user_id)
            || self.access.can_moderate(workspace_id, viewer).await?
        {
            Ok(classified)
        } else {
            Err(DomainError::not_found("classified", id))
        }
    }

    pub async fn list(
        &self,
        workspace_id: Uuid,
        viewer: Option<Uuid>,
        mut filter: ClassifiedFilter,
        pagination: Pagination,
    ) -> Result<Page<Classified>, DomainError> {
        let own = viewer.is_some() && filter.user_id == viewer;
        if !own && !self.access.can_moderate(workspace_id, viewer).await? {
            filter.status = Some(ClassifiedStatus::Active);
        }
        self.classifieds.list(&workspace_id, &filter, pagination).await
    }

    pub async fn update(
        &self,
        workspace_id: Uuid,
        id: Uuid,
        user_id: Uuid,
        input: ClassifiedUpdate,
    ) -> Result<Classified, DomainError> {
        let mut errors = input.field_errors();
        if let Some(region_ids) = &input.region_ids {
            check_region_refs(self.regions.as_ref(), region_ids, &mut errors).await?;
        }
        errors.into_result()?;

        let mut classified = self.load_own(workspace_id, id, user_id).await?;
        classified.apply(input)?;
        let classified = self.classifieds.update(&classified).await?;
        info!(classified_id = %id, status = %classified.status, "Classified updated");
        Ok(classified)
    }

    pub async fn delete(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        self.load_own(workspace_id, id, user_id).await?;
        self.classifieds.delete(&id).await?;
        info!(classified_id = %id, "Classified deleted");
        Ok(())
    }

    pub async fn mark_sold(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Classified, DomainError> {
        let mut classified = self.load_own(workspace_id, id, user_id).await?;
        classified.mark_sold()?;
        self.save(classified).await
    }

    pub async fn approve(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Classified, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        let mut classified = self.load(workspace_id, id).await?;
        classified.approve()?;
        self.save(classified).await
    }

    pub async fn reject(
        &self,
        workspace_id: Uuid,
        id: Uuid,
        user_id: Uuid,
        input: RejectClassified,
    ) -> Result<Classified, DomainError> {
        input.check()?;
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        let mut classified = self.load(workspace_id, id).await?;
        classified.reject(&input.reason)?;
        self.save(classified).await
    }

    async fn save(&self, classified: Classified) -> Result<Classified, DomainError> {
        let classified = self.classifieds.update(&classified).await?;
        info!(classified_id = %classified.id, status = %classified.status, "Classified status changed");
        Ok(classified)
    }

    async fn load(&self, workspace_id: Uuid, id: Uuid) -> Result<Classified, DomainError> {
        in_workspace(self.classifieds.find_by_id(&id).await?, workspace_id, id)
    }

    /// Only the author may edit, sell or withdraw a listing.
    async fn load_own(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Classified, DomainError> {
        let classified = self.load(workspace_id, id).await?;
        if classified.user_id != user_id {
            return Err(DomainError::Forbidden("only the author may change this listing".into()));
        }
        Ok(classified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MockClassifiedRepository, MockRegionRepository};
    use crate::services::testing::access;
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;

    fn input(region_ids: Vec<Uuid>) -> NewClassified {
        NewClassified {
            title: "Road bike, 56cm".into(),
            description: "Lightly used, new tyres and chain.".into(),
            category: "Bikes".into(),
            price_cents: Some(25_000),
            condition: None,
            contact_email: SafeEmail().fake(),
            region_ids,
            expires_at: None,
        }
    }

    fn regions(known: bool) -> MockRegionRepository {
        let mut regions = MockRegionRepository::new();
        regions
            .expect_find_missing()
            .returning(move |ids| Ok(if known { vec![] } else { ids.to_vec() }));
        regions
    }

    fn service(classifieds: MockClassifiedRepository, role: Option<WorkspaceRole>) -> ClassifiedService {
        ClassifiedService::new(Arc::new(classifieds), Arc::new(regions(true)), access(role))
    }

    #[tokio::test]
    async fn test_create_needs_existing_regions() {
        let mut classifieds = MockClassifiedRepository::new();
        classifieds.expect_create().never();
        let service = ClassifiedService::new(Arc::new(classifieds), Arc::new(regions(false)), access(None));

        match service.create(Uuid::new_v4(), Uuid::new_v4(), input(vec![Uuid::new_v4()])).await {
            Err(DomainError::Validation(errors)) => assert!(errors.contains("region_ids")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_starts_pending_review() {
        let mut classifieds = MockClassifiedRepository::new();
        classifieds.expect_create().returning(|c| Ok(c.clone()));

        let created = service(classifieds, None)
            .create(Uuid::new_v4(), Uuid::new_v4(), input(vec![Uuid::new_v4()]))
            .await
            .unwrap();
        assert_eq!(created.status, ClassifiedStatus::PendingReview);
    }

    #[tokio::test]
    async fn test_pending_listing_hidden_from_strangers() {
        let ws = Uuid::new_v4();
        let classified = Classified::create(ws, input(vec![Uuid::new_v4()]), Uuid::new_v4());
        let id = classified.id;
        let author = classified.user_id;
        let mut classifieds = MockClassifiedRepository::new();
        classifieds.expect_find_by_id().returning(move |_| Ok(Some(classified.clone())));
        let service = service(classifieds, None);

        assert!(matches!(service.get(ws, id, None).await, Err(DomainError::NotFound { .. })));
        assert!(service.get(ws, id, Some(author)).await.is_ok());
    }

    #[tokio::test]
    async fn test_only_author_marks_sold() {
        let ws = Uuid::new_v4();
        let mut classified = Classified::create(ws, input(vec![Uuid::new_v4()]), Uuid::new_v4());
        classified.approve().unwrap();
        let id = classified.id;
        let author = classified.user_id;
        let mut classifieds = MockClassifiedRepository::new();
        classifieds.expect_find_by_id().returning(move |_| Ok(Some(classified.clone())));
        classifieds.expect_update().times(1).returning(|c| Ok(c.clone()));
        let service = service(classifieds, Some(WorkspaceRole::Admin));

        let result = service.mark_sold(ws, id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));
        let sold = service.mark_sold(ws, id, author).await.unwrap();
        assert_eq!(sold.status, ClassifiedStatus::Sold);
    }

    #[tokio::test]
    async fn test_members_cannot_approve() {
        let mut classifieds = MockClassifiedRepository::new();
        classifieds.expect_find_by_id().never();
        let result = service(classifieds, Some(WorkspaceRole::Member))
            .approve(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));
    }
}
