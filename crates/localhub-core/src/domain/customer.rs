//! CRM customer entity

use chrono::{DateTime, Utc};
use localhub_shared::utils::normalize_optional;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{validate_phone, Validated};

string_enum! {
    LifecycleStage {
        Lead => "lead",
        Prospect => "prospect",
        Customer => "customer",
        Churned => "churned",
    }
}

impl Default for LifecycleStage {
    fn default() -> Self {
        LifecycleStage::Lead
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub lifecycle_stage: LifecycleStage,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCustomer {
    #[validate(length(min = 1, max = 100, message = "First name must be between 1 and 100 characters"))]
    pub first_name: String,

    #[validate(length(max = 100, message = "Last name may not exceed 100 characters"))]
    pub last_name: Option<String>,

    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,

    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,

    #[validate(length(max = 255, message = "Company may not exceed 255 characters"))]
    pub company: Option<String>,

    #[serde(default)]
    pub lifecycle_stage: LifecycleStage,

    #[validate(length(max = 5000, message = "Notes may not exceed 5000 characters"))]
    pub notes: Option<String>,
}

impl Validated for NewCustomer {}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CustomerUpdate {
    #[validate(length(min = 1, max = 100, message = "First name must be between 1 and 100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(max = 100, message = "Last name may not exceed 100 characters"))]
    pub last_name: Option<String>,

    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,

    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,

    #[validate(length(max = 255, message = "Company may not exceed 255 characters"))]
    pub company: Option<String>,

    pub lifecycle_stage: Option<LifecycleStage>,

    #[validate(length(max = 5000, message = "Notes may not exceed 5000 characters"))]
    pub notes: Option<String>,
}

impl Validated for CustomerUpdate {}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerFilter {
    pub lifecycle_stage: Option<LifecycleStage>,
    pub search: Option<String>,
}

impl Customer {
    pub fn create(workspace_id: Uuid, input: NewCustomer, created_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            first_name: input.first_name.trim().to_string(),
            last_name: normalize_optional(input.last_name),
            email: input.email.trim().to_lowercase(),
            phone: normalize_optional(input.phone),
            company: normalize_optional(input.company),
            lifecycle_stage: input.lifecycle_stage,
            notes: normalize_optional(input.notes),
            created_at: Utc::now(),
            created_by: Some(created_by),
            modified_at: None,
            removed_at: None,
        }
    }

    pub fn apply(&mut self, update: CustomerUpdate) {
        if let Some(first) = update.first_name {
            self.first_name = first.trim().to_string();
        }
        if update.last_name.is_some() {
            self.last_name = normalize_optional(update.last_name);
        }
        if let Some(email) = update.email {
            self.email = email.trim().to_lowercase();
        }
        if update.phone.is_some() {
            self.phone = normalize_optional(update.phone);
        }
        if update.company.is_some() {
            self.company = normalize_optional(update.company);
        }
        if let Some(stage) = update.lifecycle_stage {
            self.lifecycle_stage = stage;
        }
        if update.notes.is_some() {
            self.notes = normalize_optional(update.notes);
        }
        self.modified_at = Some(Utc::now());
    }

    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;

    #[test]
    fn test_create_customer() {
        let email: String = SafeEmail().fake();
        let customer = Customer::create(
            Uuid::new_v4(),
            NewCustomer {
                first_name: "Ada".into(),
                last_name: Some("Lovelace".into()),
                email: email.to_uppercase(),
                phone: None,
                company: None,
                lifecycle_stage: LifecycleStage::default(),
                notes: None,
            },
            Uuid::new_v4(),
        );
        assert_eq!(customer.email, email.to_lowercase());
        assert_eq!(customer.full_name(), "Ada Lovelace");
        assert_eq!(customer.lifecycle_stage, LifecycleStage::Lead);
    }

    #[test]
    fn test_customer_rules() {
        let input = NewCustomer {
            first_name: "".into(),
            last_name: None,
            email: "ada".into(),
            phone: Some("x".into()),
            company: None,
            lifecycle_stage: LifecycleStage::Lead,
            notes: None,
        };
        let errors = input.field_errors();
        for field in ["first_name", "email", "phone"] {
            assert!(errors.contains(field), "expected error on {field}");
        }
    }
}
