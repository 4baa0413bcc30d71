//! Workspace and membership entities

use chrono::{DateTime, Utc};
use localhub_shared::utils::{normalize_optional, slugify};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{validate_slug, FieldErrors, Validated};

string_enum! {
    /// Role inside a workspace, declared from least to most privileged so
    /// that `Ord` follows privilege.
    WorkspaceRole {
        Member => "member",
        Editor => "editor",
        Admin => "admin",
        Owner => "owner",
    }
}

impl Default for WorkspaceRole {
    fn default() -> Self {
        WorkspaceRole::Member
    }
}

impl WorkspaceRole {
    pub fn at_least(&self, minimum: WorkspaceRole) -> bool {
        *self >= minimum
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceMember {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub role: WorkspaceRole,
    pub joined_at: DateTime<Utc>,
    pub invited_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl WorkspaceMember {
    pub fn new(workspace_id: Uuid, user_id: Uuid, role: WorkspaceRole, invited_by: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            user_id,
            role,
            joined_at: Utc::now(),
            invited_by,
            modified_at: None,
        }
    }

    pub fn is_owner(&self) -> bool {
        self.role == WorkspaceRole::Owner
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewWorkspace {
    pub tenant_id: Uuid,

    #[validate(length(min = 2, max = 100, message = "Workspace name must be between 2 and 100 characters"))]
    pub name: String,

    #[validate(
        length(min = 2, max = 100, message = "Slug must be between 2 and 100 characters"),
        custom(function = "validate_slug")
    )]
    pub slug: Option<String>,

    #[validate(length(max = 1000, message = "Description too long"))]
    pub description: Option<String>,
}

impl Validated for NewWorkspace {
    fn cross_field_rules(&self, errors: &mut FieldErrors) {
        if self.slug.is_none() && slugify(&self.name).len() < 2 {
            errors.add("slug", "A slug is required when the name has no usable characters");
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct WorkspaceUpdate {
    #[validate(length(min = 2, max = 100, message = "Workspace name must be between 2 and 100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 1000, message = "Description too long"))]
    pub description: Option<String>,

    pub is_active: Option<bool>,
}

impl Validated for WorkspaceUpdate {}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddMember {
    pub user_id: Uuid,
    #[serde(default)]
    pub role: WorkspaceRole,
}

impl Validated for AddMember {}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangeMemberRole {
    pub role: WorkspaceRole,
}

impl Validated for ChangeMemberRole {}

impl Workspace {
    pub fn create(input: NewWorkspace, created_by: Uuid) -> Self {
        let slug = input.slug.unwrap_or_else(|| slugify(&input.name));
        Self {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            name: input.name.trim().to_string(),
            slug,
            description: normalize_optional(input.description),
            is_active: true,
            created_at: Utc::now(),
            created_by: Some(created_by),
            modified_at: None,
            removed_at: None,
        }
    }

    pub fn apply(&mut self, update: WorkspaceUpdate) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if update.description.is_some() {
            self.description = normalize_optional(update.description);
        }
        if let Some(active) = update.is_active {
            self.is_active = active;
        }
        self.modified_at = Some(Utc::now());
    }

    pub fn soft_delete(&mut self) {
        self.removed_at = Some(Utc::now());
        self.is_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(WorkspaceRole::Owner.at_least(WorkspaceRole::Admin));
        assert!(WorkspaceRole::Admin.at_least(WorkspaceRole::Editor));
        assert!(WorkspaceRole::Editor.at_least(WorkspaceRole::Editor));
        assert!(!WorkspaceRole::Member.at_least(WorkspaceRole::Editor));
    }

    #[test]
    fn test_create_workspace() {
        let ws = Workspace::create(
            NewWorkspace {
                tenant_id: Uuid::new_v4(),
                name: "Downtown Daily".into(),
                slug: None,
                description: None,
            },
            Uuid::new_v4(),
        );
        assert_eq!(ws.slug, "downtown-daily");
        assert!(ws.is_active);
    }

    #[test]
    fn test_workspace_rules() {
        let input = NewWorkspace {
            tenant_id: Uuid::new_v4(),
            name: "D".into(),
            slug: Some("Down Town".into()),
            description: Some("x".repeat(1001)),
        };
        let errors = input.field_errors();
        assert!(errors.contains("name"));
        assert!(errors.contains("slug"));
        assert!(errors.contains("description"));
    }

    #[test]
    fn test_member_defaults_to_member_role() {
        let body = format!(r#"{{"user_id":"{}"}}"#, Uuid::new_v4());
        let input: AddMember = serde_json::from_str(&body).unwrap();
        assert_eq!(input.role, WorkspaceRole::Member);
    }
}
