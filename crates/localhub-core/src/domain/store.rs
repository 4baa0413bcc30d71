//! Online store entity

use chrono::{DateTime, Utc};
use localhub_shared::utils::{normalize_optional, slugify};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;
use crate::validation::{validate_currency, validate_slug, FieldErrors, Validated};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub business_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub currency: String,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewStore {
    #[validate(length(min = 2, max = 255, message = "Store name must be between 2 and 255 characters"))]
    pub name: String,

    #[validate(
        length(min = 2, max = 255, message = "Slug must be between 2 and 255 characters"),
        custom(function = "validate_slug")
    )]
    pub slug: Option<String>,

    #[validate(length(max = 5000, message = "Description may not exceed 5000 characters"))]
    pub description: Option<String>,

    #[validate(custom(function = "validate_currency"))]
    pub currency: String,

    pub business_id: Option<Uuid>,
}

impl Validated for NewStore {
    fn cross_field_rules(&self, errors: &mut FieldErrors) {
        if self.slug.is_none() && slugify(&self.name).len() < 2 {
            errors.add("slug", "A slug is required when the name has no usable characters");
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct StoreUpdate {
    #[validate(length(min = 2, max = 255, message = "Store name must be between 2 and 255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 5000, message = "Description may not exceed 5000 characters"))]
    pub description: Option<String>,

    #[validate(custom(function = "validate_currency"))]
    pub currency: Option<String>,

    pub business_id: Option<Uuid>,
}

impl Validated for StoreUpdate {}

impl Store {
    pub fn create(workspace_id: Uuid, input: NewStore, created_by: Uuid) -> Self {
        let slug = input.slug.unwrap_or_else(|| slugify(&input.name));
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            business_id: input.business_id,
            name: input.name.trim().to_string(),
            slug,
            description: normalize_optional(input.description),
            currency: input.currency,
            is_published: false,
            published_at: None,
            created_at: Utc::now(),
            created_by: Some(created_by),
            modified_at: None,
            removed_at: None,
        }
    }

    pub fn apply(&mut self, update: StoreUpdate) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if update.description.is_some() {
            self.description = normalize_optional(update.description);
        }
        if let Some(currency) = update.currency {
            self.currency = currency;
        }
        if update.business_id.is_some() {
            self.business_id = update.business_id;
        }
        self.modified_at = Some(Utc::now());
    }

    pub fn publish(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.is_published {
            return Err(DomainError::transition("store", "published", "publish"));
        }
        self.is_published = true;
        self.published_at.get_or_insert(now);
        self.modified_at = Some(now);
        Ok(())
    }

    pub fn unpublish(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !self.is_published {
            return Err(DomainError::transition("store", "unpublished", "unpublish"));
        }
        self.is_published = false;
        self.modified_at = Some(now);
        Ok(())
    }

    pub fn is_public(&self) -> bool {
        self.is_published && self.removed_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewStore {
        NewStore {
            name: "Corner Bakery Shop".into(),
            slug: None,
            description: None,
            currency: "USD".into(),
            business_id: None,
        }
    }

    #[test]
    fn test_create_derives_slug() {
        let store = Store::create(Uuid::new_v4(), input(), Uuid::new_v4());
        assert_eq!(store.slug, "corner-bakery-shop");
        assert!(!store.is_public());
    }

    #[test]
    fn test_publish_toggle() {
        let mut store = Store::create(Uuid::new_v4(), input(), Uuid::new_v4());
        store.publish(Utc::now()).unwrap();
        let first = store.published_at;
        assert!(store.is_public());
        assert!(store.publish(Utc::now()).is_err());
        store.unpublish(Utc::now()).unwrap();
        assert!(store.unpublish(Utc::now()).is_err());
        store.publish(Utc::now()).unwrap();
        assert_eq!(store.published_at, first);
    }

    #[test]
    fn test_currency_rule() {
        let mut bad = input();
        bad.currency = "dollars".into();
        assert!(bad.field_errors().contains("currency"));
    }
}
