//! Business directory entity

use chrono::{DateTime, Utc};
use localhub_shared::utils::{normalize_optional, slugify};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;
use crate::validation::{validate_phone, validate_slug, FieldErrors, Validated};

string_enum! {
    BusinessStatus {
        Active => "active",
        Inactive => "inactive",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub region_ids: Vec<Uuid>,
    pub status: BusinessStatus,
    pub claimed_by: Option<Uuid>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub is_verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub follower_count: i64,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewBusiness {
    #[validate(length(min = 2, max = 255, message = "Business name must be between 2 and 255 characters"))]
    pub name: String,

    #[validate(
        length(min = 2, max = 255, message = "Slug must be between 2 and 255 characters"),
        custom(function = "validate_slug")
    )]
    pub slug: Option<String>,

    #[validate(length(max = 5000, message = "Description may not exceed 5000 characters"))]
    pub description: Option<String>,

    #[validate(length(min = 2, max = 100, message = "Category must be between 2 and 100 characters"))]
    pub category: String,

    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,

    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,

    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,

    #[validate(length(max = 500, message = "Address may not exceed 500 characters"))]
    pub address: Option<String>,

    #[serde(default)]
    #[validate(length(max = 20, message = "No more than 20 regions may be selected"))]
    pub region_ids: Vec<Uuid>,
}

impl Validated for NewBusiness {
    fn cross_field_rules(&self, errors: &mut FieldErrors) {
        if self.slug.is_none() && slugify(&self.name).len() < 2 {
            errors.add("slug", "A slug is required when the name has no usable characters");
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BusinessUpdate {
    #[validate(length(min = 2, max = 255, message = "Business name must be between 2 and 255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 5000, message = "Description may not exceed 5000 characters"))]
    pub description: Option<String>,

    #[validate(length(min = 2, max = 100, message = "Category must be between 2 and 100 characters"))]
    pub category: Option<String>,

    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,

    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,

    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,

    #[validate(length(max = 500, message = "Address may not exceed 500 characters"))]
    pub address: Option<String>,

    #[validate(length(max = 20, message = "No more than 20 regions may be selected"))]
    pub region_ids: Option<Vec<Uuid>>,

    pub status: Option<BusinessStatus>,
}

impl Validated for BusinessUpdate {}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BusinessFilter {
    pub region_id: Option<Uuid>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub status: Option<BusinessStatus>,
    pub verified: Option<bool>,
}

impl Business {
    pub fn create(workspace_id: Uuid, input: NewBusiness, created_by: Uuid) -> Self {
        let slug = input.slug.unwrap_or_else(|| slugify(&input.name));
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            name: input.name.trim().to_string(),
            slug,
            description: normalize_optional(input.description),
            category: input.category.trim().to_string(),
            email: normalize_optional(input.email).map(|e| e.to_lowercase()),
            phone: normalize_optional(input.phone),
            website: normalize_optional(input.website),
            address: normalize_optional(input.address),
            region_ids: super::dedup_ids(input.region_ids),
            status: BusinessStatus::Active,
            claimed_by: None,
            claimed_at: None,
            is_verified: false,
            verified_at: None,
            follower_count: 0,
            created_at: Utc::now(),
            created_by: Some(created_by),
            modified_at: None,
            removed_at: None,
        }
    }

    pub fn apply(&mut self, update: BusinessUpdate) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if update.description.is_some() {
            self.description = normalize_optional(update.description);
        }
        if let Some(category) = update.category {
            self.category = category.trim().to_string();
        }
        if update.email.is_some() {
            self.email = normalize_optional(update.email).map(|e| e.to_lowercase());
        }
        if update.phone.is_some() {
            self.phone = normalize_optional(update.phone);
        }
        if update.website.is_some() {
            self.website = normalize_optional(update.website);
        }
        if update.address.is_some() {
            self.address = normalize_optional(update.address);
        }
        if let Some(region_ids) = update.region_ids {
            self.region_ids = super::dedup_ids(region_ids);
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        self.modified_at = Some(Utc::now());
    }

    /// A listing can be claimed by its real owner exactly once.
    pub fn claim(&mut self, user_id: Uuid, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.claimed_by.is_some() {
            return Err(DomainError::AlreadyClaimed);
        }
        self.claimed_by = Some(user_id);
        self.claimed_at = Some(now);
        self.modified_at = Some(now);
        Ok(())
    }

    pub fn verify(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.claimed_by.is_none() {
            return Err(DomainError::transition("business", "unclaimed", "verify"));
        }
        self.is_verified = true;
        self.verified_at = Some(now);
        self.modified_at = Some(now);
        Ok(())
    }

    pub fn is_public(&self) -> bool {
        self.status == BusinessStatus::Active && self.removed_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewBusiness {
        NewBusiness {
            name: "Joe's Diner".into(),
            slug: None,
            description: None,
            category: "Restaurants".into(),
            email: Some("Hello@JoesDiner.com".into()),
            phone: Some("+1 555 010 2000".into()),
            website: Some("https://joesdiner.example".into()),
            address: None,
            region_ids: vec![],
        }
    }

    #[test]
    fn test_create_business() {
        let region = Uuid::new_v4();
        let mut input = input();
        input.region_ids = vec![region, region];
        let business = Business::create(Uuid::new_v4(), input, Uuid::new_v4());
        assert_eq!(business.slug, "joe-s-diner");
        assert_eq!(business.email.as_deref(), Some("hello@joesdiner.com"));
        assert_eq!(business.region_ids, vec![region]);
        assert!(business.is_public());
    }

    #[test]
    fn test_business_rules() {
        assert!(input().check().is_ok());

        let mut bad = input();
        bad.email = Some("nope".into());
        bad.website = Some("not a url".into());
        bad.phone = Some("call me maybe".into());
        bad.region_ids = (0..21).map(|_| Uuid::new_v4()).collect();
        let errors = bad.field_errors();
        for field in ["email", "website", "phone", "region_ids"] {
            assert!(errors.contains(field), "expected error on {field}");
        }
    }

    #[test]
    fn test_claim_once() {
        let mut business = Business::create(Uuid::new_v4(), input(), Uuid::new_v4());
        let owner = Uuid::new_v4();
        business.claim(owner, Utc::now()).unwrap();
        assert_eq!(business.claimed_by, Some(owner));
        assert!(matches!(business.claim(Uuid::new_v4(), Utc::now()), Err(DomainError::AlreadyClaimed)));
    }

    #[test]
    fn test_verify_requires_claim() {
        let mut business = Business::create(Uuid::new_v4(), input(), Uuid::new_v4());
        assert!(business.verify(Utc::now()).is_err());
        business.claim(Uuid::new_v4(), Utc::now()).unwrap();
        business.verify(Utc::now()).unwrap();
        assert!(business.is_verified);
    }

    #[test]
    fn test_update_clears_blank_optional_fields() {
        let mut business = Business::create(Uuid::new_v4(), input(), Uuid::new_v4());
        business.apply(BusinessUpdate {
            website: Some("".into()),
            status: Some(BusinessStatus::Inactive),
            ..Default::default()
        });
        assert!(business.website.is_none());
        assert!(!business.is_public());
    }
}
