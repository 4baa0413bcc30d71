//! Coupon repository trait (port)

use async_trait::async_trait;
use chrono::NaiveDate;
use localhub_shared::types::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{Coupon, CouponClaim, CouponFilter, VoteDirection};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait CouponRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Coupon>, DomainError>;
    /// `today` decides which active coupons are still inside their window.
    async fn list(&self, workspace_id: &Uuid, filter: &CouponFilter, today: NaiveDate, pagination: Pagination) -> Result<Page<Coupon>, DomainError>;
    async fn create(&self, coupon: &Coupon) -> Result<Coupon, DomainError>;
    async fn update(&self, coupon: &Coupon) -> Result<Coupon, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<(), DomainError>;
    /// Upserts the user's vote and moves the counters by the difference.
    async fn cast_vote(&self, coupon_id: &Uuid, user_id: &Uuid, direction: VoteDirection) -> Result<Coupon, DomainError>;
    /// Inserts the claim and bumps `used_count` while it is under
    /// `usage_limit`. Fails with `CouponUnavailable` otherwise.
    async fn claim(&self, claim: &CouponClaim) -> Result<CouponClaim, DomainError>;
    async fn find_claim(&self, coupon_id: &Uuid, user_id: &Uuid) -> Result<Option<CouponClaim>, DomainError>;
}
