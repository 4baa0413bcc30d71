//! Calendar entity: a followable collection of events.

use chrono::{DateTime, Utc};
use localhub_shared::utils::normalize_optional;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::Validated;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub follower_count: i64,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCalendar {
    #[validate(length(min = 2, max = 255, message = "Calendar name must be between 2 and 255 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description may not exceed 2000 characters"))]
    pub description: Option<String>,

    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

impl Validated for NewCalendar {}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CalendarUpdate {
    #[validate(length(min = 2, max = 255, message = "Calendar name must be between 2 and 255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 2000, message = "Description may not exceed 2000 characters"))]
    pub description: Option<String>,

    pub is_public: Option<bool>,
}

impl Validated for CalendarUpdate {}

impl Calendar {
    pub fn create(workspace_id: Uuid, input: NewCalendar, created_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            name: input.name.trim().to_string(),
            description: normalize_optional(input.description),
            is_public: input.is_public,
            follower_count: 0,
            created_at: Utc::now(),
            created_by: Some(created_by),
            modified_at: None,
            removed_at: None,
        }
    }

    pub fn apply(&mut self, update: CalendarUpdate) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if update.description.is_some() {
            self.description = normalize_optional(update.description);
        }
        if let Some(public) = update.is_public {
            self.is_public = public;
        }
        self.modified_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_defaults_public() {
        let input: NewCalendar = serde_json::from_str(r#"{"name":"Farmers Markets"}"#).unwrap();
        assert!(input.is_public);
        let calendar = Calendar::create(Uuid::new_v4(), input, Uuid::new_v4());
        assert_eq!(calendar.follower_count, 0);
    }

    #[test]
    fn test_calendar_rules() {
        let input = NewCalendar { name: "X".into(), description: None, is_public: false };
        assert!(input.field_errors().contains("name"));
    }
}
