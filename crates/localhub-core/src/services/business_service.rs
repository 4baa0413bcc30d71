//! Business directory

use std::sync::Arc;

use chrono::Utc;
use localhub_shared::types::{Page, Pagination};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Business, BusinessFilter, BusinessStatus, BusinessUpdate, NewBusiness, WorkspaceRole};
use crate::error::DomainError;
use crate::repositories::{BusinessRepository, RegionRepository};
use crate::services::access::WorkspaceAccess;
use crate::services::region_service::check_region_refs;
use crate::services::scope::in_workspace;
use crate::validation::Validated;

pub struct BusinessService {
    businesses: Arc<dyn BusinessRepository>,
    regions: Arc<dyn RegionRepository>,
    access: WorkspaceAccess,
}

impl BusinessService {
    pub fn new(
        businesses: Arc<dyn BusinessRepository>,
        regions: Arc<dyn RegionRepository>,
        access: WorkspaceAccess,
    ) -> Self {
        Self { businesses, regions, access }
    }

    pub async fn create(&self, workspace_id: Uuid, user_id: Uuid, input: NewBusiness) -> Result<Business, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        let mut errors = input.field_errors();
        check_region_refs(self.regions.as_ref(), &input.region_ids, &mut errors).await?;
        errors.into_result()?;

        let business = self.businesses.create(&Business::create(workspace_id, input, user_id)).await?;
        info!(business_id = %business.id, %workspace_id, "Business created");
        Ok(business)
    }

    /// Inactive businesses are visible to editors only.
    pub async fn get(&self, workspace_id: Uuid, id: Uuid, viewer: Option<Uuid>) -> Result<Business, DomainError> {
        let business = self.load(workspace_id, id).await?;
        if business.is_public() || self.access.can_moderate(workspace_id, viewer).await? {
            Ok(business)
        } else {
            Err(DomainError::not_found("business", id))
        }
    }

    pub async fn list(
        &self,
        workspace_id: Uuid,
        viewer: Option<Uuid>,
        mut filter: BusinessFilter,
        pagination: Pagination,
    ) -> Result<Page<Business>, DomainError> {
        if !self.access.can_moderate(workspace_id, viewer).await? {
            filter.status = Some(BusinessStatus::Active);
        }
        self.businesses.list(&workspace_id, &filter, pagination).await
    }

    pub async fn update(
        &self,
        workspace_id: Uuid,
        id: Uuid,
        user_id: Uuid,
        input: BusinessUpdate,
    ) -> Result<Business, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        let mut errors = input.field_errors();
        if let Some(region_ids) = &input.region_ids {
            check_region_refs(self.regions.as_ref(), region_ids, &mut errors).await?;
        }
        errors.into_result()?;

        let mut business = self.load(workspace_id, id).await?;
        business.apply(input);
        let business = self.businesses.update(&business).await?;
        info!(business_id = %id, "Business updated");
        Ok(business)
    }

    pub async fn delete(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        self.load(workspace_id, id).await?;
        self.businesses.delete(&id).await?;
        info!(business_id = %id, "Business deleted");
        Ok(())
    }

    /// Any signed-in user may claim an unclaimed, active listing.
    pub async fn claim(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Business, DomainError> {
        let mut business = self.load(workspace_id, id).await?;
        if !business.is_public() {
            return Err(DomainError::not_found("business", id));
        }
        let now = Utc::now();
        business.claim(user_id, now)?;

        // The conditional update settles races between two claimants.
        match self.businesses.claim(&id, &user_id, now).await? {
            Some(claimed) => {
                info!(business_id = %id, %user_id, "Business claimed");
                Ok(claimed)
            }
            None => {
                warn!(business_id = %id, %user_id, "Business claimed concurrently");
                Err(DomainError::AlreadyClaimed)
            }
        }
    }

    pub async fn verify(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Business, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Admin).await?;
        let mut business = self.load(workspace_id, id).await?;
        business.verify(Utc::now())?;
        let business = self.businesses.update(&business).await?;
        info!(business_id = %id, "Business verified");
        Ok(business)
    }

    async fn load(&self, workspace_id: Uuid, id: Uuid) -> Result<Business, DomainError> {
        in_workspace(self.businesses.find_by_id(&id).await?, workspace_id, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MockBusinessRepository, MockRegionRepository};
    use crate::services::testing::access;

    fn input(region_ids: Vec<Uuid>) -> NewBusiness {
        NewBusiness {
            name: "Blue Door Cafe".into(),
            slug: None,
            description: None,
            category: "Restaurants".into(),
            email: None,
            phone: None,
            website: None,
            address: None,
            region_ids,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_regions() {
        let mut regions = MockRegionRepository::new();
        regions.expect_find_missing().returning(|ids| Ok(ids.to_vec()));
        let mut repo = MockBusinessRepository::new();
        repo.expect_create().never();

        let service = BusinessService::new(Arc::new(repo), Arc::new(regions), access(Some(WorkspaceRole::Editor)));
        let err = service
            .create(Uuid::new_v4(), Uuid::new_v4(), input(vec![Uuid::new_v4()]))
            .await
            .unwrap_err();
        match err {
            DomainError::Validation(errors) => assert!(errors.contains("region_ids")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_members_cannot_create() {
        let service = BusinessService::new(
            Arc::new(MockBusinessRepository::new()),
            Arc::new(MockRegionRepository::new()),
            access(Some(WorkspaceRole::Member)),
        );
        let result = service.create(Uuid::new_v4(), Uuid::new_v4(), input(vec![])).await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_claim_race_reports_already_claimed() {
        let ws = Uuid::new_v4();
        let business = Business::create(ws, input(vec![]), Uuid::new_v4());
        let id = business.id;
        let mut repo = MockBusinessRepository::new();
        repo.expect_find_by_id().returning(move |_| Ok(Some(business.clone())));
        repo.expect_claim().returning(|_, _, _| Ok(None));

        let service = BusinessService::new(Arc::new(repo), Arc::new(MockRegionRepository::new()), access(None));
        assert!(matches!(service.claim(ws, id, Uuid::new_v4()).await, Err(DomainError::AlreadyClaimed)));
    }

    #[tokio::test]
    async fn test_other_workspace_is_not_found() {
        let business = Business::create(Uuid::new_v4(), input(vec![]), Uuid::new_v4());
        let id = business.id;
        let mut repo = MockBusinessRepository::new();
        repo.expect_find_by_id().returning(move |_| Ok(Some(business.clone())));

        let service = BusinessService::new(Arc::new(repo), Arc::new(MockRegionRepository::new()), access(None));
        assert!(matches!(
            service.get(Uuid::new_v4(), id, None).await,
            Err(DomainError::NotFound { entity: "business", .. })
        ));
    }
}
