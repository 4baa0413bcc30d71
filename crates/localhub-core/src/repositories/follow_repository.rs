//! Follow repository trait (port)

use async_trait::async_trait;
use localhub_shared::types::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{Follow, FollowableKind};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Inserts the follow and bumps the target's `follower_count` when it is
    /// new. Returns whether anything changed.
    async fn follow(&self, follow: &Follow) -> Result<bool, DomainError>;
    /// Removes the follow and decrements the counter when one existed.
    async fn unfollow(&self, user_id: &Uuid, kind: FollowableKind, target_id: &Uuid) -> Result<bool, DomainError>;
    async fn is_following(&self, user_id: &Uuid, kind: FollowableKind, target_id: &Uuid) -> Result<bool, DomainError>;
    async fn list_for_user(&self, user_id: &Uuid, kind: Option<FollowableKind>, pagination: Pagination) -> Result<Page<Follow>, DomainError>;
}
