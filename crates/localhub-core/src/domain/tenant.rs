// ============================================================================
// LocalHub Core - Tenant Entity
// File: crates/localhub-core/src/domain/tenant.rs
// Description: Tenant entity with subscription plan and workspace quota
// ============================================================================

use chrono::{DateTime, Utc};
use localhub_shared::utils::{normalize_optional, slugify};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{validate_slug, FieldErrors, Validated};

string_enum! {
    /// Subscription plan enumeration
    SubscriptionPlan {
        Free => "free",
        Basic => "basic",
        Premium => "premium",
        Enterprise => "enterprise",
    }
}

impl Default for SubscriptionPlan {
    fn default() -> Self {
        SubscriptionPlan::Free
    }
}

impl SubscriptionPlan {
    /// Workspace quota a plan starts with when none is given explicitly.
    pub fn default_max_workspaces(&self) -> i32 {
        match self {
            SubscriptionPlan::Free => 1,
            SubscriptionPlan::Basic => 3,
            SubscriptionPlan::Premium => 10,
            SubscriptionPlan::Enterprise => 100,
        }
    }
}

/// Tenant entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub plan: SubscriptionPlan,
    pub max_workspaces: i32,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
    pub removed_at: Option<DateTime<Utc>>,
    pub removed_by: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTenant {
    #[validate(length(min = 2, max = 100, message = "Tenant name must be between 2 and 100 characters"))]
    pub name: String,

    #[validate(
        length(min = 2, max = 100, message = "Slug must be between 2 and 100 characters"),
        custom(function = "validate_slug")
    )]
    pub slug: Option<String>,

    #[validate(length(max = 1000, message = "Description too long"))]
    pub description: Option<String>,

    #[serde(default)]
    pub plan: SubscriptionPlan,

    #[validate(range(min = 1, max = 1000, message = "Max workspaces must be between 1 and 1000"))]
    pub max_workspaces: Option<i32>,
}

impl Validated for NewTenant {
    fn cross_field_rules(&self, errors: &mut FieldErrors) {
        if self.slug.is_none() && slugify(&self.name).len() < 2 {
            errors.add("slug", "A slug is required when the name has no usable characters");
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TenantUpdate {
    #[validate(length(min = 2, max = 100, message = "Tenant name must be between 2 and 100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 1000, message = "Description too long"))]
    pub description: Option<String>,

    pub plan: Option<SubscriptionPlan>,

    #[validate(range(min = 1, max = 1000, message = "Max workspaces must be between 1 and 1000"))]
    pub max_workspaces: Option<i32>,

    pub is_active: Option<bool>,
}

impl Validated for TenantUpdate {}

impl Tenant {
    pub fn create(input: NewTenant, created_by: Option<Uuid>) -> Self {
        let slug = input.slug.unwrap_or_else(|| slugify(&input.name));
        Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            slug: slug.trim().to_lowercase(),
            description: normalize_optional(input.description),
            is_active: true,
            max_workspaces: input
                .max_workspaces
                .unwrap_or_else(|| input.plan.default_max_workspaces()),
            plan: input.plan,
            created_at: Utc::now(),
            created_by,
            modified_at: None,
            modified_by: None,
            removed_at: None,
            removed_by: None,
        }
    }

    pub fn apply(&mut self, update: TenantUpdate, modified_by: Uuid) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if update.description.is_some() {
            self.description = normalize_optional(update.description);
        }
        if let Some(plan) = update.plan {
            self.plan = plan;
        }
        if let Some(max) = update.max_workspaces {
            self.max_workspaces = max;
        }
        if let Some(active) = update.is_active {
            self.is_active = active;
        }
        self.modified_at = Some(Utc::now());
        self.modified_by = Some(modified_by);
    }

    pub fn soft_delete(&mut self, deleted_by: Uuid) {
        self.removed_at = Some(Utc::now());
        self.removed_by = Some(deleted_by);
        self.is_active = false;
    }

    pub fn is_deleted(&self) -> bool {
        self.removed_at.is_some()
    }

    pub fn can_add_workspace(&self, current_count: i64) -> bool {
        current_count < self.max_workspaces as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> NewTenant {
        NewTenant {
            name: name.to_string(),
            slug: None,
            description: Some("  ".to_string()),
            plan: SubscriptionPlan::Basic,
            max_workspaces: None,
        }
    }

    #[test]
    fn test_create_tenant_derives_slug_and_quota() {
        let tenant = Tenant::create(input("Springfield Media Group"), None);
        assert_eq!(tenant.slug, "springfield-media-group");
        assert_eq!(tenant.max_workspaces, 3);
        assert!(tenant.description.is_none());
        assert!(tenant.is_active);
    }

    #[test]
    fn test_tenant_rules() {
        assert!(input("Springfield").check().is_ok());

        let mut bad = input("S");
        bad.slug = Some("Bad Slug".into());
        bad.max_workspaces = Some(0);
        let errors = bad.field_errors();
        assert!(errors.contains("name"));
        assert!(errors.contains("slug"));
        assert!(errors.contains("max_workspaces"));
    }

    #[test]
    fn test_unsluggable_name_requires_slug() {
        let errors = input("!!!").field_errors();
        assert!(errors.contains("slug"));
    }

    #[test]
    fn test_workspace_quota() {
        let tenant = Tenant::create(input("Springfield"), None);
        assert!(tenant.can_add_workspace(2));
        assert!(!tenant.can_add_workspace(3));
    }

    #[test]
    fn test_soft_delete() {
        let mut tenant = Tenant::create(input("Springfield"), None);
        tenant.soft_delete(Uuid::new_v4());
        assert!(tenant.is_deleted());
        assert!(!tenant.is_active);
    }

    #[test]
    fn test_plan_round_trip() {
        for plan in SubscriptionPlan::ALL {
            assert_eq!(SubscriptionPlan::from_str(plan.as_str()), Some(*plan));
        }
        assert_eq!(SubscriptionPlan::from_str("gold"), None);
    }
}
