//! Classified listing entity

use chrono::{DateTime, Duration, Utc};
use localhub_shared::constants::DEFAULT_CLASSIFIED_TTL_DAYS;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;
use crate::validation::{FieldErrors, Validated};

string_enum! {
    ClassifiedStatus {
        PendingReview => "pending_review",
        Active => "active",
        Sold => "sold",
        Rejected => "rejected",
        Expired => "expired",
    }
}

string_enum! {
    ItemCondition {
        New => "new",
        LikeNew => "like_new",
        Good => "good",
        Fair => "fair",
        Poor => "poor",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classified {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price_cents: Option<i64>,
    pub condition: Option<ItemCondition>,
    pub contact_email: String,
    pub region_ids: Vec<Uuid>,
    pub status: ClassifiedStatus,
    pub rejection_reason: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewClassified {
    #[validate(length(min = 3, max = 255, message = "Title must be between 3 and 255 characters"))]
    pub title: String,

    #[validate(length(min = 10, max = 5000, message = "Description must be between 10 and 5000 characters"))]
    pub description: String,

    #[validate(length(min = 2, max = 100, message = "Category must be between 2 and 100 characters"))]
    pub category: String,

    #[validate(range(min = 0, message = "Price may not be negative"))]
    pub price_cents: Option<i64>,

    pub condition: Option<ItemCondition>,

    #[validate(email(message = "Contact email must be a valid email address"))]
    pub contact_email: String,

    #[validate(length(min = 1, max = 20, message = "Select between 1 and 20 regions"))]
    pub region_ids: Vec<Uuid>,

    pub expires_at: Option<DateTime<Utc>>,
}

impl Validated for NewClassified {
    fn cross_field_rules(&self, errors: &mut FieldErrors) {
        if let Some(expires_at) = self.expires_at {
            if expires_at <= Utc::now() {
                errors.add("expires_at", "The expiry must be a date in the future");
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ClassifiedUpdate {
    #[validate(length(min = 3, max = 255, message = "Title must be between 3 and 255 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 10, max = 5000, message = "Description must be between 10 and 5000 characters"))]
    pub description: Option<String>,

    #[validate(length(min = 2, max = 100, message = "Category must be between 2 and 100 characters"))]
    pub category: Option<String>,

    #[validate(range(min = 0, message = "Price may not be negative"))]
    pub price_cents: Option<i64>,

    pub condition: Option<ItemCondition>,

    #[validate(email(message = "Contact email must be a valid email address"))]
    pub contact_email: Option<String>,

    #[validate(length(min = 1, max = 20, message = "Select between 1 and 20 regions"))]
    pub region_ids: Option<Vec<Uuid>>,

    pub expires_at: Option<DateTime<Utc>>,
}

impl Validated for ClassifiedUpdate {
    fn cross_field_rules(&self, errors: &mut FieldErrors) {
        if let Some(expires_at) = self.expires_at {
            if expires_at <= Utc::now() {
                errors.add("expires_at", "The expiry must be a date in the future");
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RejectClassified {
    #[validate(length(min = 1, max = 1000, message = "Reason must be between 1 and 1000 characters"))]
    pub reason: String,
}

impl Validated for RejectClassified {}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassifiedFilter {
    pub status: Option<ClassifiedStatus>,
    pub region_id: Option<Uuid>,
    pub category: Option<String>,
    pub user_id: Option<Uuid>,
    pub search: Option<String>,
}

impl Classified {
    pub fn create(workspace_id: Uuid, input: NewClassified, user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            user_id,
            title: input.title.trim().to_string(),
            description: input.description,
            category: input.category.trim().to_string(),
            price_cents: input.price_cents,
            condition: input.condition,
            contact_email: input.contact_email.trim().to_lowercase(),
            region_ids: super::dedup_ids(input.region_ids),
            status: ClassifiedStatus::PendingReview,
            rejection_reason: None,
            expires_at: input
                .expires_at
                .unwrap_or(now + Duration::days(DEFAULT_CLASSIFIED_TTL_DAYS)),
            created_at: now,
            modified_at: None,
            removed_at: None,
        }
    }

    /// Authors editing a rejected or active listing send it back to review.
    pub fn apply(&mut self, update: ClassifiedUpdate) -> Result<(), DomainError> {
        if matches!(self.status, ClassifiedStatus::Sold | ClassifiedStatus::Expired) {
            return Err(DomainError::transition("classified", self.status, "edit"));
        }
        if let Some(title) = update.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(category) = update.category {
            self.category = category.trim().to_string();
        }
        if update.price_cents.is_some() {
            self.price_cents = update.price_cents;
        }
        if update.condition.is_some() {
            self.condition = update.condition;
        }
        if let Some(email) = update.contact_email {
            self.contact_email = email.trim().to_lowercase();
        }
        if let Some(region_ids) = update.region_ids {
            self.region_ids = super::dedup_ids(region_ids);
        }
        if let Some(expires_at) = update.expires_at {
            self.expires_at = expires_at;
        }
        self.status = ClassifiedStatus::PendingReview;
        self.rejection_reason = None;
        self.modified_at = Some(Utc::now());
        Ok(())
    }

    pub fn approve(&mut self) -> Result<(), DomainError> {
        match self.status {
            ClassifiedStatus::PendingReview => {
                self.status = ClassifiedStatus::Active;
                self.modified_at = Some(Utc::now());
                Ok(())
            }
            other => Err(DomainError::transition("classified", other, "approve")),
        }
    }

    pub fn reject(&mut self, reason: &str) -> Result<(), DomainError> {
        match self.status {
            ClassifiedStatus::PendingReview | ClassifiedStatus::Active => {
                self.status = ClassifiedStatus::Rejected;
                self.rejection_reason = Some(reason.trim().to_string());
                self.modified_at = Some(Utc::now());
                Ok(())
            }
            other => Err(DomainError::transition("classified", other, "reject")),
        }
    }

    pub fn mark_sold(&mut self) -> Result<(), DomainError> {
        match self.status {
            ClassifiedStatus::Active => {
                self.status = ClassifiedStatus::Sold;
                self.modified_at = Some(Utc::now());
                Ok(())
            }
            other => Err(DomainError::transition("classified", other, "mark as sold")),
        }
    }

    pub fn effective_status(&self, now: DateTime<Utc>) -> ClassifiedStatus {
        if self.status == ClassifiedStatus::Active && self.expires_at <= now {
            ClassifiedStatus::Expired
        } else {
            self.status
        }
    }

    pub fn is_public(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == ClassifiedStatus::Active && self.removed_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewClassified {
        NewClassified {
            title: "Road bike, 54cm".into(),
            description: "Lightly used, new tires last spring.".into(),
            category: "Bicycles".into(),
            price_cents: Some(35000),
            condition: Some(ItemCondition::Good),
            contact_email: "Seller@Example.com".into(),
            region_ids: vec![Uuid::new_v4()],
            expires_at: None,
        }
    }

    #[test]
    fn test_create_defaults() {
        let classified = Classified::create(Uuid::new_v4(), input(), Uuid::new_v4());
        assert_eq!(classified.status, ClassifiedStatus::PendingReview);
        assert_eq!(classified.contact_email, "seller@example.com");
        assert!(classified.expires_at > Utc::now() + Duration::days(29));
    }

    #[test]
    fn test_rules() {
        let mut bad = input();
        bad.region_ids = vec![];
        bad.description = "short".into();
        bad.expires_at = Some(Utc::now() - Duration::days(1));
        bad.price_cents = Some(-5);
        let errors = bad.field_errors();
        for field in ["region_ids", "description", "expires_at", "price_cents"] {
            assert!(errors.contains(field), "expected error on {field}");
        }
    }

    #[test]
    fn test_lifecycle() {
        let mut classified = Classified::create(Uuid::new_v4(), input(), Uuid::new_v4());
        assert!(classified.mark_sold().is_err());
        classified.approve().unwrap();
        assert!(classified.is_public(Utc::now()));
        classified.mark_sold().unwrap();
        assert!(!classified.is_public(Utc::now()));
        assert!(classified.apply(ClassifiedUpdate::default()).is_err());
    }

    #[test]
    fn test_edit_resubmits() {
        let mut classified = Classified::create(Uuid::new_v4(), input(), Uuid::new_v4());
        classified.reject("Prohibited item").unwrap();
        classified
            .apply(ClassifiedUpdate { title: Some("Road bike".into()), ..Default::default() })
            .unwrap();
        assert_eq!(classified.status, ClassifiedStatus::PendingReview);
        assert!(classified.rejection_reason.is_none());
    }

    #[test]
    fn test_expiry() {
        let mut classified = Classified::create(Uuid::new_v4(), input(), Uuid::new_v4());
        classified.approve().unwrap();
        let later = classified.expires_at + Duration::seconds(1);
        assert_eq!(classified.effective_status(later), ClassifiedStatus::Expired);
    }
}
