//! Region tree management and region reference checks

use std::sync::Arc;

use localhub_shared::types::{Page, Pagination};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{NewRegion, Region, RegionFilter, RegionUpdate};
use crate::error::DomainError;
use crate::repositories::RegionRepository;
use crate::validation::{FieldErrors, Validated};

/// Adds an error under `region_ids` for every id that matches no region.
pub async fn check_region_refs(
    regions: &dyn RegionRepository,
    ids: &[Uuid],
    errors: &mut FieldErrors,
) -> Result<(), DomainError> {
    if ids.is_empty() {
        return Ok(());
    }
    for missing in regions.find_missing(ids).await? {
        errors.add("region_ids", format!("Region {} does not exist", missing));
    }
    Ok(())
}

pub struct RegionService {
    regions: Arc<dyn RegionRepository>,
}

impl RegionService {
    pub fn new(regions: Arc<dyn RegionRepository>) -> Self {
        Self { regions }
    }

    pub async fn create(&self, input: NewRegion) -> Result<Region, DomainError> {
        input.check()?;
        if let Some(parent_id) = input.parent_id {
            let parent = self
                .regions
                .find_by_id(&parent_id)
                .await?
                .ok_or_else(|| DomainError::field("parent_id", "Parent region does not exist"))?;
            Region::ensure_parent_of(&parent, input.kind)?;
        }
        let region = self.regions.create(&Region::create(input)).await?;
        info!(region_id = %region.id, kind = %region.kind, "Region created");
        Ok(region)
    }

    pub async fn get(&self, id: Uuid) -> Result<Region, DomainError> {
        self.regions
            .find_by_id(&id)
            .await?
            .ok_or_else(|| DomainError::not_found("region", id))
    }

    pub async fn list(&self, filter: &RegionFilter, pagination: Pagination) -> Result<Page<Region>, DomainError> {
        self.regions.list(filter, pagination).await
    }

    pub async fn update(&self, id: Uuid, input: RegionUpdate) -> Result<Region, DomainError> {
        input.check()?;
        let mut region = self.get(id).await?;
        region.apply(input);
        self.regions.update(&region).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        self.get(id).await?;
        if self.regions.count_children(&id).await? > 0 {
            warn!(region_id = %id, "Refused to delete region with children");
            return Err(DomainError::Conflict("Region still has child regions".into()));
        }
        self.regions.delete(&id).await?;
        info!(region_id = %id, "Region deleted");
        Ok(())
    }

    /// Every id must reference an existing region.
    pub async fn ensure_exist(&self, ids: &[Uuid]) -> Result<(), DomainError> {
        let mut errors = FieldErrors::default();
        check_region_refs(self.regions.as_ref(), ids, &mut errors).await?;
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RegionKind;
    use crate::repositories::MockRegionRepository;

    fn new_region(kind: RegionKind, parent_id: Option<Uuid>) -> NewRegion {
        NewRegion { parent_id, kind, name: "Oak Park".into(), slug: None, latitude: None, longitude: None }
    }

    #[tokio::test]
    async fn test_parent_must_be_one_level_broader() {
        let state = Region::create(new_region(RegionKind::State, None));
        let state_id = state.id;
        let mut repo = MockRegionRepository::new();
        repo.expect_find_by_id().returning(move |_| Ok(Some(state.clone())));
        repo.expect_create().returning(|r| Ok(r.clone()));

        let service = RegionService::new(Arc::new(repo));
        assert!(service.create(new_region(RegionKind::County, Some(state_id))).await.is_ok());
        let err = service.create(new_region(RegionKind::City, Some(state_id))).await.unwrap_err();
        match err {
            DomainError::Validation(errors) => assert!(errors.contains("parent_id")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_with_children_is_refused() {
        let region = Region::create(new_region(RegionKind::State, None));
        let id = region.id;
        let mut repo = MockRegionRepository::new();
        repo.expect_find_by_id().returning(move |_| Ok(Some(region.clone())));
        repo.expect_count_children().returning(|_| Ok(2));
        repo.expect_delete().never();

        let service = RegionService::new(Arc::new(repo));
        assert!(matches!(service.delete(id).await, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_ensure_exist_names_missing_ids() {
        let known = Uuid::new_v4();
        let unknown = Uuid::new_v4();
        let mut repo = MockRegionRepository::new();
        repo.expect_find_missing()
            .returning(move |ids| Ok(ids.iter().copied().filter(|id| *id != known).collect()));

        let service = RegionService::new(Arc::new(repo));
        assert!(service.ensure_exist(&[known]).await.is_ok());
        match service.ensure_exist(&[known, unknown]).await {
            Err(DomainError::Validation(errors)) => {
                let messages = errors.get("region_ids").unwrap();
                assert_eq!(messages.len(), 1);
                assert!(messages[0].contains(&unknown.to_string()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
