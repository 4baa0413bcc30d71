//! News post entity and its editorial workflow

use chrono::{DateTime, Utc};
use localhub_shared::utils::{normalize_optional, slugify};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;
use crate::validation::{validate_slug, FieldErrors, Validated};

string_enum! {
    PostStatus {
        Draft => "draft",
        PendingReview => "pending_review",
        Published => "published",
        Archived => "archived",
        Rejected => "rejected",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub body: String,
    pub category: Option<String>,
    pub featured_image: Option<String>,
    pub region_ids: Vec<Uuid>,
    pub status: PostStatus,
    pub rejection_reason: Option<String>,
    pub published_at: Option<DateTime<Utc>>,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPost {
    #[validate(length(min = 3, max = 255, message = "Title must be between 3 and 255 characters"))]
    pub title: String,

    #[validate(
        length(min = 2, max = 255, message = "Slug must be between 2 and 255 characters"),
        custom(function = "validate_slug")
    )]
    pub slug: Option<String>,

    #[validate(length(max = 500, message = "Excerpt may not exceed 500 characters"))]
    pub excerpt: Option<String>,

    #[validate(length(min = 10, message = "Body must be at least 10 characters"))]
    pub body: String,

    #[validate(length(max = 100, message = "Category may not exceed 100 characters"))]
    pub category: Option<String>,

    #[validate(url(message = "Featured image must be a valid URL"))]
    pub featured_image: Option<String>,

    #[serde(default)]
    #[validate(length(max = 20, message = "No more than 20 regions may be selected"))]
    pub region_ids: Vec<Uuid>,
}

impl Validated for NewPost {
    fn cross_field_rules(&self, errors: &mut FieldErrors) {
        if self.slug.is_none() && slugify(&self.title).len() < 2 {
            errors.add("slug", "A slug is required when the title has no usable characters");
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PostUpdate {
    #[validate(length(min = 3, max = 255, message = "Title must be between 3 and 255 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 500, message = "Excerpt may not exceed 500 characters"))]
    pub excerpt: Option<String>,

    #[validate(length(min = 10, message = "Body must be at least 10 characters"))]
    pub body: Option<String>,

    #[validate(length(max = 100, message = "Category may not exceed 100 characters"))]
    pub category: Option<String>,

    #[validate(url(message = "Featured image must be a valid URL"))]
    pub featured_image: Option<String>,

    #[validate(length(max = 20, message = "No more than 20 regions may be selected"))]
    pub region_ids: Option<Vec<Uuid>>,
}

impl Validated for PostUpdate {}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RejectPost {
    #[validate(length(min = 1, max = 1000, message = "Reason must be between 1 and 1000 characters"))]
    pub reason: String,
}

impl Validated for RejectPost {}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub region_id: Option<Uuid>,
    pub category: Option<String>,
    pub author_id: Option<Uuid>,
    pub search: Option<String>,
}

impl Post {
    pub fn create(workspace_id: Uuid, input: NewPost, author_id: Uuid) -> Self {
        let slug = input.slug.unwrap_or_else(|| slugify(&input.title));
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            author_id,
            title: input.title.trim().to_string(),
            slug,
            excerpt: normalize_optional(input.excerpt),
            body: input.body,
            category: normalize_optional(input.category),
            featured_image: normalize_optional(input.featured_image),
            region_ids: super::dedup_ids(input.region_ids),
            status: PostStatus::Draft,
            rejection_reason: None,
            published_at: None,
            created_at: Utc::now(),
            modified_at: None,
            removed_at: None,
        }
    }

    /// Editing a rejected post sends it back to draft.
    pub fn apply(&mut self, update: PostUpdate) {
        if let Some(title) = update.title {
            self.title = title.trim().to_string();
        }
        if update.excerpt.is_some() {
            self.excerpt = normalize_optional(update.excerpt);
        }
        if let Some(body) = update.body {
            self.body = body;
        }
        if update.category.is_some() {
            self.category = normalize_optional(update.category);
        }
        if update.featured_image.is_some() {
            self.featured_image = normalize_optional(update.featured_image);
        }
        if let Some(region_ids) = update.region_ids {
            self.region_ids = super::dedup_ids(region_ids);
        }
        if self.status == PostStatus::Rejected {
            self.status = PostStatus::Draft;
            self.rejection_reason = None;
        }
        self.modified_at = Some(Utc::now());
    }

    pub fn submit(&mut self) -> Result<(), DomainError> {
        match self.status {
            PostStatus::Draft => {
                self.status = PostStatus::PendingReview;
                self.touch();
                Ok(())
            }
            other => Err(DomainError::transition("post", other, "submit")),
        }
    }

    /// Editors may publish drafts directly. Archived posts stay archived.
    pub fn publish(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        match self.status {
            PostStatus::Draft | PostStatus::PendingReview => {
                self.mark_published(now);
                Ok(())
            }
            other => Err(DomainError::transition("post", other, "publish")),
        }
    }

    pub fn approve(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        match self.status {
            PostStatus::PendingReview => {
                self.mark_published(now);
                Ok(())
            }
            other => Err(DomainError::transition("post", other, "approve")),
        }
    }

    pub fn reject(&mut self, reason: &str) -> Result<(), DomainError> {
        match self.status {
            PostStatus::PendingReview => {
                self.status = PostStatus::Rejected;
                self.rejection_reason = Some(reason.trim().to_string());
                self.touch();
                Ok(())
            }
            other => Err(DomainError::transition("post", other, "reject")),
        }
    }

    pub fn archive(&mut self) -> Result<(), DomainError> {
        match self.status {
            PostStatus::Published => {
                self.status = PostStatus::Archived;
                self.touch();
                Ok(())
            }
            other => Err(DomainError::transition("post", other, "archive")),
        }
    }

    pub fn is_public(&self) -> bool {
        self.status == PostStatus::Published && self.removed_at.is_none()
    }

    fn mark_published(&mut self, now: DateTime<Utc>) {
        self.status = PostStatus::Published;
        self.published_at.get_or_insert(now);
        self.modified_at = Some(now);
    }

    fn touch(&mut self) {
        self.modified_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> Post {
        Post::create(
            Uuid::new_v4(),
            NewPost {
                title: "City Council Approves New Park".into(),
                slug: None,
                excerpt: None,
                body: "The council voted 5-2 on Tuesday evening.".into(),
                category: Some("Government".into()),
                featured_image: None,
                region_ids: vec![],
            },
            Uuid::new_v4(),
        )
    }

    #[test]
    fn test_review_workflow() {
        let mut post = post();
        assert_eq!(post.status, PostStatus::Draft);
        post.submit().unwrap();
        post.reject("Needs a source").unwrap();
        assert_eq!(post.rejection_reason.as_deref(), Some("Needs a source"));

        post.apply(PostUpdate { body: Some("Updated with a source link.".into()), ..Default::default() });
        assert_eq!(post.status, PostStatus::Draft);
        assert!(post.rejection_reason.is_none());

        post.submit().unwrap();
        post.approve(Utc::now()).unwrap();
        assert!(post.is_public());
        assert!(post.published_at.is_some());
    }

    #[test]
    fn test_rejected_post_must_be_edited_before_resubmitting() {
        let mut post = post();
        post.submit().unwrap();
        post.reject("Missing the vote count").unwrap();
        assert!(matches!(post.submit(), Err(DomainError::InvalidStateTransition { .. })));
        assert!(post.publish(Utc::now()).is_err());
        assert_eq!(post.status, PostStatus::Rejected);
    }

    #[test]
    fn test_archived_post_cannot_be_republished() {
        let mut post = post();
        let first = Utc::now() - chrono::Duration::days(3);
        post.publish(first).unwrap();
        post.archive().unwrap();
        assert!(matches!(post.publish(Utc::now()), Err(DomainError::InvalidStateTransition { .. })));
        assert_eq!(post.status, PostStatus::Archived);
        assert_eq!(post.published_at, Some(first));
    }

    #[test]
    fn test_invalid_transitions() {
        let mut post = post();
        assert!(matches!(post.approve(Utc::now()), Err(DomainError::InvalidStateTransition { .. })));
        assert!(post.archive().is_err());
        assert!(post.reject("no").is_err());
        post.publish(Utc::now()).unwrap();
        assert!(post.submit().is_err());
        assert!(post.publish(Utc::now()).is_err());
    }

    #[test]
    fn test_post_rules() {
        let input = NewPost {
            title: "Hi".into(),
            slug: None,
            excerpt: Some("x".repeat(501)),
            body: "short".into(),
            category: None,
            featured_image: Some("nope".into()),
            region_ids: vec![],
        };
        let errors = input.field_errors();
        for field in ["title", "excerpt", "body", "featured_image"] {
            assert!(errors.contains(field), "expected error on {field}");
        }
    }
}
