//! News posts and their moderation workflow

use std::sync::Arc;

use chrono::Utc;
use localhub_shared::types::{Page, Pagination};
use tracing::info;
use uuid::Uuid;

use crate::domain::{NewPost, Post, PostFilter, PostStatus, PostUpdate, RejectPost, WorkspaceRole};
use crate::error::DomainError;
use crate::repositories::{PostRepository, RegionRepository};
use crate::services::access::WorkspaceAccess;
use crate::services::region_service::check_region_refs;
use crate::services::scope::in_workspace;
use crate::validation::Validated;

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    regions: Arc<dyn RegionRepository>,
    access: WorkspaceAccess,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, regions: Arc<dyn RegionRepository>, access: WorkspaceAccess) -> Self {
        Self { posts, regions, access }
    }

    /// Any member may write; posts start as drafts.
    pub async fn create(&self, workspace_id: Uuid, user_id: Uuid, input: NewPost) -> Result<Post, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Member).await?;
        let mut errors = input.field_errors();
        check_region_refs(self.regions.as_ref(), &input.region_ids, &mut errors).await?;
        errors.into_result()?;

        let post = self.posts.create(&Post::create(workspace_id, input, user_id)).await?;
        info!(post_id = %post.id, %workspace_id, "Post created");
        Ok(post)
    }

    pub async fn get(&self, workspace_id: Uuid, id: Uuid, viewer: Option<Uuid>) -> Result<Post, DomainError> {
        let post = self.load(workspace_id, id).await?;
        if post.is_public()
            || viewer == Some(post.author_id)
            || self.access.can_moderate(workspace_id, viewer).await?
        {
            Ok(post)
        } else {
            Err(DomainError::not_found("post", id))
        }
    }

    /// Anonymous readers and plain members only see published posts, plus
    /// their own when filtering by author.
    pub async fn list(
        &self,
        workspace_id: Uuid,
        viewer: Option<Uuid>,
        mut filter: PostFilter,
        pagination: Pagination,
    ) -> Result<Page<Post>, DomainError> {
        let own = viewer.is_some() && filter.author_id == viewer;
        if !own && !self.access.can_moderate(workspace_id, viewer).await? {
            filter.status = Some(PostStatus::Published);
        }
        self.posts.list(&workspace_id, &filter, pagination).await
    }

    pub async fn update(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid, input: PostUpdate) -> Result<Post, DomainError> {
        let mut errors = input.field_errors();
        if let Some(region_ids) = &input.region_ids {
            check_region_refs(self.regions.as_ref(), region_ids, &mut errors).await?;
        }
        errors.into_result()?;

        let mut post = self.load(workspace_id, id).await?;
        self.ensure_author_or_editor(&post, user_id).await?;
        post.apply(input);
        let post = self.posts.update(&post).await?;
        info!(post_id = %id, "Post updated");
        Ok(post)
    }

    pub async fn delete(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        let post = self.load(workspace_id, id).await?;
        self.ensure_author_or_editor(&post, user_id).await?;
        self.posts.delete(&id).await?;
        info!(post_id = %id, "Post deleted");
        Ok(())
    }

    pub async fn submit(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Post, DomainError> {
        let mut post = self.load(workspace_id, id).await?;
        self.ensure_author_or_editor(&post, user_id).await?;
        post.submit()?;
        self.save(post, "submitted").await
    }

    pub async fn publish(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Post, DomainError> {
        let mut post = self.moderated(workspace_id, id, user_id).await?;
        post.publish(Utc::now())?;
        self.save(post, "published").await
    }

    pub async fn approve(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Post, DomainError> {
        let mut post = self.moderated(workspace_id, id, user_id).await?;
        post.approve(Utc::now())?;
        self.save(post, "approved").await
    }

    pub async fn reject(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid, input: RejectPost) -> Result<Post, DomainError> {
        input.check()?;
        let mut post = self.moderated(workspace_id, id, user_id).await?;
        post.reject(&input.reason)?;
        self.save(post, "rejected").await
    }

    pub async fn archive(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Post, DomainError> {
        let mut post = self.moderated(workspace_id, id, user_id).await?;
        post.archive()?;
        self.save(post, "archived").await
    }

    async fn save(&self, post: Post, action: &str) -> Result<Post, DomainError> {
        let post = self.posts.update(&post).await?;
        info!(post_id = %post.id, status = %post.status, "Post {}", action);
        Ok(post)
    }

    async fn moderated(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Post, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        self.load(workspace_id, id).await
    }

    async fn ensure_author_or_editor(&self, post: &Post, user_id: Uuid) -> Result<(), DomainError> {
        if post.author_id == user_id {
            return Ok(());
        }
        self.access.require(post.workspace_id, user_id, WorkspaceRole::Editor).await?;
        Ok(())
    }

    async fn load(&self, workspace_id: Uuid, id: Uuid) -> Result<Post, DomainError> {
        in_workspace(self.posts.find_by_id(&id).await?, workspace_id, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MockPostRepository, MockRegionRepository};
    use crate::services::testing::access;

    fn post(workspace_id: Uuid, author: Uuid) -> Post {
        Post::create(
            workspace_id,
            NewPost {
                title: "Farmers market opens Saturday".into(),
                slug: None,
                excerpt: None,
                body: "Stalls open at eight on Main Street.".into(),
                category: None,
                featured_image: None,
                region_ids: vec![],
            },
            author,
        )
    }

    fn service(post: Post, role: Option<WorkspaceRole>) -> PostService {
        let mut repo = MockPostRepository::new();
        repo.expect_find_by_id().returning(move |_| Ok(Some(post.clone())));
        repo.expect_update().returning(|p| Ok(p.clone()));
        PostService::new(Arc::new(repo), Arc::new(MockRegionRepository::new()), access(role))
    }

    #[tokio::test]
    async fn test_submit_then_approve() {
        let (ws, author) = (Uuid::new_v4(), Uuid::new_v4());
        let draft = post(ws, author);
        let id = draft.id;

        let submitted = service(draft, Some(WorkspaceRole::Member)).submit(ws, id, author).await.unwrap();
        assert_eq!(submitted.status, PostStatus::PendingReview);

        let approved = service(submitted, Some(WorkspaceRole::Editor))
            .approve(ws, id, Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(approved.status, PostStatus::Published);
        assert!(approved.published_at.is_some());
    }

    #[tokio::test]
    async fn test_approve_draft_is_invalid_transition() {
        let ws = Uuid::new_v4();
        let draft = post(ws, Uuid::new_v4());
        let id = draft.id;
        let result = service(draft, Some(WorkspaceRole::Editor)).approve(ws, id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(DomainError::InvalidStateTransition { entity: "post", .. })));
    }

    #[tokio::test]
    async fn test_members_cannot_publish() {
        let ws = Uuid::new_v4();
        let draft = post(ws, Uuid::new_v4());
        let id = draft.id;
        let result = service(draft, Some(WorkspaceRole::Member)).publish(ws, id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_drafts_hidden_from_anonymous_readers() {
        let ws = Uuid::new_v4();
        let draft = post(ws, Uuid::new_v4());
        let id = draft.id;
        let result = service(draft, None).get(ws, id, None).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}
