//! Community organizations directory

use std::sync::Arc;

use localhub_shared::types::{Page, Pagination};
use tracing::info;
use uuid::Uuid;

use crate::domain::{NewOrganization, Organization, OrganizationFilter, OrganizationUpdate, WorkspaceRole};
use crate::error::DomainError;
use crate::repositories::{OrganizationRepository, RegionRepository};
use crate::services::access::WorkspaceAccess;
use crate::services::region_service::check_region_refs;
use crate::services::scope::in_workspace;
use crate::validation::Validated;

pub struct OrganizationService {
    organizations: Arc<dyn OrganizationRepository>,
    regions: Arc<dyn RegionRepository>,
    access: WorkspaceAccess,
}

impl OrganizationService {
    pub fn new(
        organizations: Arc<dyn OrganizationRepository>,
        regions: Arc<dyn RegionRepository>,
        access: WorkspaceAccess,
    ) -> Self {
        Self { organizations, regions, access }
    }

    pub async fn create(&self, workspace_id: Uuid, user_id: Uuid, input: NewOrganization) -> Result<Organization, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        let mut errors = input.field_errors();
        check_region_refs(self.regions.as_ref(), &input.region_ids, &mut errors).await?;
        errors.into_result()?;

        let organization = self
            .organizations
            .create(&Organization::create(workspace_id, input, user_id))
            .await?;
        info!(organization_id = %organization.id, kind = %organization.kind, "Organization created");
        Ok(organization)
    }

    /// Organizations are public once created.
    pub async fn get(&self, workspace_id: Uuid, id: Uuid) -> Result<Organization, DomainError> {
        self.load(workspace_id, id).await
    }

    pub async fn list(
        &self,
        workspace_id: Uuid,
        filter: OrganizationFilter,
        pagination: Pagination,
    ) -> Result<Page<Organization>, DomainError> {
        self.organizations.list(&workspace_id, &filter, pagination).await
    }

    pub async fn update(
        &self,
        workspace_id: Uuid,
        id: Uuid,
        user_id: Uuid,
        input: OrganizationUpdate,
    ) -> Result<Organization, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        let mut errors = input.field_errors();
        if let Some(region_ids) = &input.region_ids {
            check_region_refs(self.regions.as_ref(), region_ids, &mut errors).await?;
        }
        errors.into_result()?;

        let mut organization = self.load(workspace_id, id).await?;
        organization.apply(input);
        let organization = self.organizations.update(&organization).await?;
        info!(organization_id = %id, "Organization updated");
        Ok(organization)
    }

    pub async fn delete(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Admin).await?;
        self.load(workspace_id, id).await?;
        self.organizations.delete(&id).await?;
        info!(organization_id = %id, "Organization deleted");
        Ok(())
    }

    async fn load(&self, workspace_id: Uuid, id: Uuid) -> Result<Organization, DomainError> {
        in_workspace(self.organizations.find_by_id(&id).await?, workspace_id, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrganizationKind;
    use crate::repositories::{MockOrganizationRepository, MockRegionRepository};
    use crate::services::testing::access;

    fn input() -> NewOrganization {
        NewOrganization {
            name: "Riverside Food Bank".into(),
            slug: None,
            kind: OrganizationKind::Nonprofit,
            description: None,
            website: Some("https://riverside-food.example.org".into()),
            email: None,
            region_ids: vec![Uuid::new_v4()],
        }
    }

    #[tokio::test]
    async fn test_create_checks_regions() {
        let mut regions = MockRegionRepository::new();
        regions.expect_find_missing().returning(|ids| Ok(ids.to_vec()));
        let mut organizations = MockOrganizationRepository::new();
        organizations.expect_create().never();
        let service = OrganizationService::new(Arc::new(organizations), Arc::new(regions), access(Some(WorkspaceRole::Editor)));

        match service.create(Uuid::new_v4(), Uuid::new_v4(), input()).await {
            Err(DomainError::Validation(errors)) => assert!(errors.contains("region_ids")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_derives_slug() {
        let mut regions = MockRegionRepository::new();
        regions.expect_find_missing().returning(|_| Ok(vec![]));
        let mut organizations = MockOrganizationRepository::new();
        organizations.expect_create().returning(|o| Ok(o.clone()));
        let service = OrganizationService::new(Arc::new(organizations), Arc::new(regions), access(Some(WorkspaceRole::Editor)));

        let created = service.create(Uuid::new_v4(), Uuid::new_v4(), input()).await.unwrap();
        assert_eq!(created.slug, "riverside-food-bank");
        assert_eq!(created.follower_count, 0);
    }

    #[tokio::test]
    async fn test_editors_cannot_delete() {
        let mut organizations = MockOrganizationRepository::new();
        organizations.expect_delete().never();
        let service = OrganizationService::new(
            Arc::new(organizations),
            Arc::new(MockRegionRepository::new()),
            access(Some(WorkspaceRole::Editor)),
        );

        let result = service.delete(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));
    }
}
