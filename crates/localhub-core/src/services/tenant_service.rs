//! Tenant management

use std::sync::Arc;

use localhub_shared::types::{Page, Pagination};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{NewTenant, Tenant, TenantUpdate};
use crate::error::DomainError;
use crate::repositories::TenantRepository;
use crate::validation::Validated;

pub struct TenantService {
    tenants: Arc<dyn TenantRepository>,
}

impl TenantService {
    pub fn new(tenants: Arc<dyn TenantRepository>) -> Self {
        Self { tenants }
    }

    pub async fn create(&self, user_id: Uuid, input: NewTenant) -> Result<Tenant, DomainError> {
        input.check()?;
        let tenant = Tenant::create(input, Some(user_id));
        if self.tenants.find_by_slug(&tenant.slug).await?.is_some() {
            return Err(DomainError::field("slug", "This slug is already taken"));
        }
        let tenant = self.tenants.create(&tenant).await?;
        info!(tenant_id = %tenant.id, slug = %tenant.slug, "Tenant created");
        Ok(tenant)
    }

    pub async fn get(&self, id: Uuid) -> Result<Tenant, DomainError> {
        self.tenants
            .find_by_id(&id)
            .await?
            .filter(|t| !t.is_deleted())
            .ok_or_else(|| DomainError::not_found("tenant", id))
    }

    pub async fn list(&self, pagination: Pagination) -> Result<Page<Tenant>, DomainError> {
        self.tenants.list(pagination).await
    }

    pub async fn update(&self, id: Uuid, user_id: Uuid, input: TenantUpdate) -> Result<Tenant, DomainError> {
        input.check()?;
        let mut tenant = self.get(id).await?;
        Self::ensure_owner(&tenant, user_id)?;
        tenant.apply(input, user_id);
        let tenant = self.tenants.update(&tenant).await?;
        info!(tenant_id = %tenant.id, "Tenant updated");
        Ok(tenant)
    }

    pub async fn deactivate(&self, id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        let mut tenant = self.get(id).await?;
        Self::ensure_owner(&tenant, user_id)?;
        tenant.soft_delete(user_id);
        self.tenants.update(&tenant).await?;
        info!(tenant_id = %id, "Tenant deactivated");
        Ok(())
    }

    fn ensure_owner(tenant: &Tenant, user_id: Uuid) -> Result<(), DomainError> {
        if tenant.created_by == Some(user_id) {
            Ok(())
        } else {
            warn!(tenant_id = %tenant.id, %user_id, "Tenant change by non-owner");
            Err(DomainError::Forbidden("only the tenant owner may change it".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SubscriptionPlan;
    use crate::repositories::MockTenantRepository;

    fn new_tenant() -> NewTenant {
        NewTenant {
            name: "Springfield Media".into(),
            slug: None,
            description: None,
            plan: SubscriptionPlan::Basic,
            max_workspaces: None,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_taken_slug() {
        let mut repo = MockTenantRepository::new();
        repo.expect_find_by_slug()
            .returning(|_| Ok(Some(Tenant::create(new_tenant(), None))));
        repo.expect_create().never();

        let service = TenantService::new(Arc::new(repo));
        let err = service.create(Uuid::new_v4(), new_tenant()).await.unwrap_err();
        match err {
            DomainError::Validation(errors) => assert!(errors.contains("slug")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_only_creator_may_update() {
        let owner = Uuid::new_v4();
        let tenant = Tenant::create(new_tenant(), Some(owner));
        let id = tenant.id;
        let mut repo = MockTenantRepository::new();
        repo.expect_find_by_id().returning(move |_| Ok(Some(tenant.clone())));
        repo.expect_update().returning(|t| Ok(t.clone()));

        let service = TenantService::new(Arc::new(repo));
        assert!(matches!(
            service.update(id, Uuid::new_v4(), TenantUpdate::default()).await,
            Err(DomainError::Forbidden(_))
        ));
        let updated = service
            .update(id, owner, TenantUpdate { plan: Some(SubscriptionPlan::Premium), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(updated.plan, SubscriptionPlan::Premium);
    }
}
