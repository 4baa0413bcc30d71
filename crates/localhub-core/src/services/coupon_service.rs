//! Coupons: moderation, voting and claims

use std::sync::Arc;

use chrono::Utc;
use localhub_shared::constants::REDEMPTION_CODE_LENGTH;
use localhub_shared::types::{Page, Pagination};
use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    CastVote, Coupon, CouponClaim, CouponFilter, CouponStatus, CouponUpdate, NewCoupon, RejectCoupon, WorkspaceRole,
};
use crate::error::DomainError;
use crate::repositories::{BusinessRepository, CouponRepository, RegionRepository};
use crate::services::access::WorkspaceAccess;
use crate::services::region_service::check_region_refs;
use crate::services::scope::in_workspace;
use crate::validation::Validated;

/// No 0/O or 1/I so codes survive being read aloud at a counter.
const REDEMPTION_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub fn generate_redemption_code() -> String {
    let mut rng = rand::rng();
    (0..REDEMPTION_CODE_LENGTH)
        .map(|_| REDEMPTION_ALPHABET[rng.random_range(0..REDEMPTION_ALPHABET.len())] as char)
        .collect()
}

pub struct CouponService {
    coupons: Arc<dyn CouponRepository>,
    businesses: Arc<dyn BusinessRepository>,
    regions: Arc<dyn RegionRepository>,
    access: WorkspaceAccess,
}

impl CouponService {
    pub fn new(
        coupons: Arc<dyn CouponRepository>,
        businesses: Arc<dyn BusinessRepository>,
        regions: Arc<dyn RegionRepository>,
        access: WorkspaceAccess,
    ) -> Self {
        Self { coupons, businesses, regions, access }
    }

    pub async fn create(&self, workspace_id: Uuid, user_id: Uuid, input: NewCoupon) -> Result<Coupon, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;

        let mut errors = input.field_errors();
        let business = self.businesses.find_by_id(&input.business_id).await?;
        if in_workspace(business, workspace_id, input.business_id).is_err() {
            errors.add("business_id", "Business does not exist in this workspace");
        }
        check_region_refs(self.regions.as_ref(), &input.region_ids, &mut errors).await?;
        errors.into_result()?;

        let coupon = self.coupons.create(&Coupon::create(workspace_id, input, user_id)).await?;
        info!(coupon_id = %coupon.id, code = %coupon.code, "Coupon created");
        Ok(coupon)
    }

    pub async fn get(&self, workspace_id: Uuid, id: Uuid, viewer: Option<Uuid>) -> Result<Coupon, DomainError> {
        let coupon = self.load(workspace_id, id).await?;
        if coupon.is_public(Utc::now().date_naive()) || self.access.can_moderate(workspace_id, viewer).await? {
            Ok(coupon)
        } else {
            Err(DomainError::not_found("coupon", id))
        }
    }

    /// The public sees active coupons still inside their date window.
    pub async fn list(
        &self,
        workspace_id: Uuid,
        viewer: Option<Uuid>,
        mut filter: CouponFilter,
        pagination: Pagination,
    ) -> Result<Page<Coupon>, DomainError> {
        let today = Utc::now().date_naive();
        if !self.access.can_moderate(workspace_id, viewer).await? {
            filter.status = Some(CouponStatus::Active);
            filter.valid_on.get_or_insert(today);
        }
        self.coupons.list(&workspace_id, &filter, today, pagination).await
    }

    pub async fn update(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid, input: CouponUpdate) -> Result<Coupon, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        let mut errors = input.field_errors();
        if let Some(region_ids) = &input.region_ids {
            check_region_refs(self.regions.as_ref(), region_ids, &mut errors).await?;
        }
        errors.into_result()?;

        let mut coupon = self.load(workspace_id, id).await?;
        coupon.apply(input)?;
        let coupon = self.coupons.update(&coupon).await?;
        info!(coupon_id = %id, "Coupon updated");
        Ok(coupon)
    }

    pub async fn delete(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        self.load(workspace_id, id).await?;
        self.coupons.delete(&id).await?;
        info!(coupon_id = %id, "Coupon deleted");
        Ok(())
    }

    pub async fn submit(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Coupon, DomainError> {
        let mut coupon = self.load(workspace_id, id).await?;
        if coupon.created_by != Some(user_id) {
            self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        }
        coupon.submit()?;
        self.save(coupon).await
    }

    pub async fn approve(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Coupon, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        let mut coupon = self.load(workspace_id, id).await?;
        coupon.approve(Utc::now().date_naive())?;
        self.save(coupon).await
    }

    pub async fn reject(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid, input: RejectCoupon) -> Result<Coupon, DomainError> {
        input.check()?;
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        let mut coupon = self.load(workspace_id, id).await?;
        coupon.reject(&input.reason)?;
        self.save(coupon).await
    }

    /// One vote per user; repeating a vote changes nothing.
    pub async fn vote(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid, input: CastVote) -> Result<Coupon, DomainError> {
        let coupon = self.load(workspace_id, id).await?;
        if !coupon.is_public(Utc::now().date_naive()) {
            return Err(DomainError::CouponUnavailable(format!(
                "coupon is {}",
                coupon.effective_status(Utc::now().date_naive())
            )));
        }
        let coupon = self.coupons.cast_vote(&id, &user_id, input.direction).await?;
        info!(coupon_id = %id, %user_id, direction = %input.direction, score = coupon.score(), "Coupon vote cast");
        Ok(coupon)
    }

    pub async fn claim(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<CouponClaim, DomainError> {
        let coupon = self.load(workspace_id, id).await?;
        coupon.ensure_claimable(Utc::now().date_naive())?;
        if self.coupons.find_claim(&id, &user_id).await?.is_some() {
            warn!(coupon_id = %id, %user_id, "Duplicate coupon claim");
            return Err(DomainError::CouponUnavailable("already claimed".into()));
        }

        let claim = CouponClaim::new(id, user_id, generate_redemption_code());
        let claim = self.coupons.claim(&claim).await?;
        info!(coupon_id = %id, %user_id, "Coupon claimed");
        Ok(claim)
    }

    async fn save(&self, coupon: Coupon) -> Result<Coupon, DomainError> {
        let coupon = self.coupons.update(&coupon).await?;
        info!(coupon_id = %coupon.id, status = %coupon.status, "Coupon status changed");
        Ok(coupon)
    }

    async fn load(&self, workspace_id: Uuid, id: Uuid) -> Result<Coupon, DomainError> {
        in_workspace(self.coupons.find_by_id(&id).await?, workspace_id, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Business, DiscountType, NewBusiness};
    use crate::repositories::{MockBusinessRepository, MockCouponRepository, MockRegionRepository};
    use crate::services::testing::access;
    use chrono::{Duration, NaiveDate};

    fn business(workspace_id: Uuid) -> Business {
        Business::create(
            workspace_id,
            NewBusiness {
                name: "Main Street Books".into(),
                slug: None,
                description: None,
                category: "Retail".into(),
                email: None,
                phone: None,
                website: None,
                address: None,
                region_ids: vec![],
            },
            Uuid::new_v4(),
        )
    }

    fn new_coupon(business_id: Uuid, start: NaiveDate, end: NaiveDate, region_ids: Vec<Uuid>) -> NewCoupon {
        NewCoupon {
            business_id,
            title: "20% off paperbacks".into(),
            code: "BOOKS-20".into(),
            description: None,
            terms: None,
            discount_type: DiscountType::Percentage,
            discount_value: Some(20),
            start_date: start,
            end_date: end,
            usage_limit: Some(2),
            region_ids,
        }
    }

    fn service(coupons: MockCouponRepository, business: Business, known_regions: bool) -> CouponService {
        let mut businesses = MockBusinessRepository::new();
        businesses.expect_find_by_id().returning(move |_| Ok(Some(business.clone())));
        let mut regions = MockRegionRepository::new();
        regions
            .expect_find_missing()
            .returning(move |ids| Ok(if known_regions { vec![] } else { ids.to_vec() }));
        CouponService::new(Arc::new(coupons), Arc::new(businesses), Arc::new(regions), access(Some(WorkspaceRole::Editor)))
    }

    #[tokio::test]
    async fn test_end_date_must_follow_start_date() {
        let ws = Uuid::new_v4();
        let b = business(ws);
        let today = Utc::now().date_naive();
        let mut coupons = MockCouponRepository::new();
        coupons.expect_create().never();

        let result = service(coupons, b.clone(), true)
            .create(ws, Uuid::new_v4(), new_coupon(b.id, today, today, vec![]))
            .await;
        match result {
            Err(DomainError::Validation(errors)) => assert!(errors.contains("end_date")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_region_ids_must_exist() {
        let ws = Uuid::new_v4();
        let b = business(ws);
        let today = Utc::now().date_naive();
        let mut coupons = MockCouponRepository::new();
        coupons.expect_create().never();

        let input = new_coupon(b.id, today, today + Duration::days(30), vec![Uuid::new_v4()]);
        match service(coupons, b, false).create(ws, Uuid::new_v4(), input).await {
            Err(DomainError::Validation(errors)) => assert!(errors.contains("region_ids")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_business_from_other_workspace_is_rejected() {
        let ws = Uuid::new_v4();
        let foreign = business(Uuid::new_v4());
        let today = Utc::now().date_naive();
        let mut coupons = MockCouponRepository::new();
        coupons.expect_create().never();

        let input = new_coupon(foreign.id, today, today + Duration::days(30), vec![]);
        match service(coupons, foreign, true).create(ws, Uuid::new_v4(), input).await {
            Err(DomainError::Validation(errors)) => assert!(errors.contains("business_id")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_claim_requires_active_coupon_and_single_claim() {
        let ws = Uuid::new_v4();
        let b = business(ws);
        let today = Utc::now().date_naive();
        let mut coupon = Coupon::create(ws, new_coupon(b.id, today - Duration::days(1), today + Duration::days(5), vec![]), Uuid::new_v4());
        let id = coupon.id;

        let draft = coupon.clone();
        let mut coupons = MockCouponRepository::new();
        coupons.expect_find_by_id().returning(move |_| Ok(Some(draft.clone())));
        let result = service(coupons, b.clone(), true).claim(ws, id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(DomainError::CouponUnavailable(_))));

        coupon.approve(today).unwrap();
        let claimer = Uuid::new_v4();
        let mut coupons = MockCouponRepository::new();
        coupons.expect_find_by_id().returning(move |_| Ok(Some(coupon.clone())));
        coupons
            .expect_find_claim()
            .returning(|c, u| Ok(Some(CouponClaim::new(*c, *u, "ALREADY".into()))));
        coupons.expect_claim().never();
        let result = service(coupons, b, true).claim(ws, id, claimer).await;
        assert!(matches!(result, Err(DomainError::CouponUnavailable(_))));
    }

    #[test]
    fn test_redemption_codes() {
        let code = generate_redemption_code();
        assert_eq!(code.len(), REDEMPTION_CODE_LENGTH);
        assert!(code.bytes().all(|b| REDEMPTION_ALPHABET.contains(&b)));
        assert_ne!(generate_redemption_code(), generate_redemption_code());
    }
}
