//! Community organization entity

use chrono::{DateTime, Utc};
use localhub_shared::utils::{normalize_optional, slugify};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{validate_slug, FieldErrors, Validated};

string_enum! {
    OrganizationKind {
        Nonprofit => "nonprofit",
        Government => "government",
        School => "school",
        Religious => "religious",
        Club => "club",
        Other => "other",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub slug: String,
    pub kind: OrganizationKind,
    pub description: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub region_ids: Vec<Uuid>,
    pub follower_count: i64,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewOrganization {
    #[validate(length(min = 2, max = 255, message = "Name must be between 2 and 255 characters"))]
    pub name: String,

    #[validate(
        length(min = 2, max = 255, message = "Slug must be between 2 and 255 characters"),
        custom(function = "validate_slug")
    )]
    pub slug: Option<String>,

    pub kind: OrganizationKind,

    #[validate(length(max = 5000, message = "Description may not exceed 5000 characters"))]
    pub description: Option<String>,

    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,

    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,

    #[serde(default)]
    #[validate(length(max = 20, message = "No more than 20 regions may be selected"))]
    pub region_ids: Vec<Uuid>,
}

impl Validated for NewOrganization {
    fn cross_field_rules(&self, errors: &mut FieldErrors) {
        if self.slug.is_none() && slugify(&self.name).len() < 2 {
            errors.add("slug", "A slug is required when the name has no usable characters");
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct OrganizationUpdate {
    #[validate(length(min = 2, max = 255, message = "Name must be between 2 and 255 characters"))]
    pub name: Option<String>,

    pub kind: Option<OrganizationKind>,

    #[validate(length(max = 5000, message = "Description may not exceed 5000 characters"))]
    pub description: Option<String>,

    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,

    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,

    #[validate(length(max = 20, message = "No more than 20 regions may be selected"))]
    pub region_ids: Option<Vec<Uuid>>,
}

impl Validated for OrganizationUpdate {}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganizationFilter {
    pub kind: Option<OrganizationKind>,
    pub region_id: Option<Uuid>,
    pub search: Option<String>,
}

impl Organization {
    pub fn create(workspace_id: Uuid, input: NewOrganization, created_by: Uuid) -> Self {
        let slug = input.slug.unwrap_or_else(|| slugify(&input.name));
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            name: input.name.trim().to_string(),
            slug,
            kind: input.kind,
            description: normalize_optional(input.description),
            website: normalize_optional(input.website),
            email: normalize_optional(input.email).map(|e| e.to_lowercase()),
            region_ids: super::dedup_ids(input.region_ids),
            follower_count: 0,
            created_at: Utc::now(),
            created_by: Some(created_by),
            modified_at: None,
            removed_at: None,
        }
    }

    pub fn apply(&mut self, update: OrganizationUpdate) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(kind) = update.kind {
            self.kind = kind;
        }
        if update.description.is_some() {
            self.description = normalize_optional(update.description);
        }
        if update.website.is_some() {
            self.website = normalize_optional(update.website);
        }
        if update.email.is_some() {
            self.email = normalize_optional(update.email).map(|e| e.to_lowercase());
        }
        if let Some(region_ids) = update.region_ids {
            self.region_ids = super::dedup_ids(region_ids);
        }
        self.modified_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_organization() {
        let region = Uuid::new_v4();
        let org = Organization::create(
            Uuid::new_v4(),
            NewOrganization {
                name: "Friends of the Library".into(),
                slug: None,
                kind: OrganizationKind::Nonprofit,
                description: Some("  ".into()),
                website: Some("https://friends.example.org".into()),
                email: Some("Hello@Friends.example.org".into()),
                region_ids: vec![region, region],
            },
            Uuid::new_v4(),
        );
        assert_eq!(org.slug, "friends-of-the-library");
        assert!(org.description.is_none());
        assert_eq!(org.email.as_deref(), Some("hello@friends.example.org"));
        assert_eq!(org.region_ids, vec![region]);
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in OrganizationKind::ALL {
            assert_eq!(OrganizationKind::from_str(kind.as_str()), Some(*kind));
        }
        assert_eq!(OrganizationKind::from_str("company"), None);
    }
}
