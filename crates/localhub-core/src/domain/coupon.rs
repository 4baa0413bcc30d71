//! Coupon entity: discounts, moderation, voting and claims

use chrono::{DateTime, NaiveDate, Utc};
use localhub_shared::utils::normalize_optional;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;
use crate::validation::{validate_coupon_code, FieldErrors, Validated};

string_enum! {
    DiscountType {
        Percentage => "percentage",
        FixedAmount => "fixed_amount",
        Bogo => "bogo",
        FreeItem => "free_item",
    }
}

string_enum! {
    CouponStatus {
        Draft => "draft",
        PendingReview => "pending_review",
        Active => "active",
        Rejected => "rejected",
        Expired => "expired",
    }
}

string_enum! {
    VoteDirection {
        Up => "up",
        Down => "down",
    }
}

string_enum! {
    CouponSort {
        Newest => "newest",
        Popular => "popular",
        EndingSoon => "ending_soon",
    }
}

impl Default for CouponSort {
    fn default() -> Self {
        CouponSort::Newest
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub business_id: Uuid,
    pub title: String,
    pub code: String,
    pub description: Option<String>,
    pub terms: Option<String>,
    pub discount_type: DiscountType,
    /// Whole percent for percentage coupons, cents for fixed amounts.
    pub discount_value: Option<i64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub region_ids: Vec<Uuid>,
    pub status: CouponStatus,
    pub rejection_reason: Option<String>,
    pub upvotes: i32,
    pub downvotes: i32,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponVote {
    pub coupon_id: Uuid,
    pub user_id: Uuid,
    pub direction: VoteDirection,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponClaim {
    pub id: Uuid,
    pub coupon_id: Uuid,
    pub user_id: Uuid,
    pub redemption_code: String,
    pub claimed_at: DateTime<Utc>,
}

impl CouponClaim {
    pub fn new(coupon_id: Uuid, user_id: Uuid, redemption_code: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            coupon_id,
            user_id,
            redemption_code,
            claimed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCoupon {
    pub business_id: Uuid,

    #[validate(length(min = 3, max = 255, message = "Title must be between 3 and 255 characters"))]
    pub title: String,

    #[validate(custom(function = "validate_coupon_code"))]
    pub code: String,

    #[validate(length(max = 2000, message = "Description may not exceed 2000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 2000, message = "Terms may not exceed 2000 characters"))]
    pub terms: Option<String>,

    pub discount_type: DiscountType,

    pub discount_value: Option<i64>,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    #[validate(range(min = 1, max = 1000000, message = "Usage limit must be between 1 and 1000000"))]
    pub usage_limit: Option<i32>,

    #[serde(default)]
    #[validate(length(max = 20, message = "No more than 20 regions may be selected"))]
    pub region_ids: Vec<Uuid>,
}

impl Validated for NewCoupon {
    fn cross_field_rules(&self, errors: &mut FieldErrors) {
        date_order_rule(self.start_date, self.end_date, errors);
        discount_rule(self.discount_type, self.discount_value, errors);
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CouponUpdate {
    #[validate(length(min = 3, max = 255, message = "Title must be between 3 and 255 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description may not exceed 2000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 2000, message = "Terms may not exceed 2000 characters"))]
    pub terms: Option<String>,

    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<i64>,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    #[validate(range(min = 1, max = 1000000, message = "Usage limit must be between 1 and 1000000"))]
    pub usage_limit: Option<i32>,

    #[validate(length(max = 20, message = "No more than 20 regions may be selected"))]
    pub region_ids: Option<Vec<Uuid>>,
}

impl Validated for CouponUpdate {
    fn cross_field_rules(&self, errors: &mut FieldErrors) {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            date_order_rule(start, end, errors);
        }
        if let Some(discount_type) = self.discount_type {
            discount_rule(discount_type, self.discount_value, errors);
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CastVote {
    pub direction: VoteDirection,
}

impl Validated for CastVote {}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RejectCoupon {
    #[validate(length(min = 1, max = 1000, message = "Reason must be between 1 and 1000 characters"))]
    pub reason: String,
}

impl Validated for RejectCoupon {}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CouponFilter {
    pub business_id: Option<Uuid>,
    pub region_id: Option<Uuid>,
    pub status: Option<CouponStatus>,
    pub discount_type: Option<DiscountType>,
    #[serde(default)]
    pub sort: CouponSort,
    /// Only coupons whose date window contains this day.
    pub valid_on: Option<NaiveDate>,
}

fn date_order_rule(start: NaiveDate, end: NaiveDate, errors: &mut FieldErrors) {
    if end <= start {
        errors.add("end_date", "The end date must be a date after the start date");
    }
}

fn discount_rule(discount_type: DiscountType, value: Option<i64>, errors: &mut FieldErrors) {
    match (discount_type, value) {
        (DiscountType::Percentage, Some(v)) if !(1..=100).contains(&v) => {
            errors.add("discount_value", "A percentage discount must be between 1 and 100")
        }
        (DiscountType::FixedAmount, Some(v)) if v < 1 => {
            errors.add("discount_value", "A fixed discount must be greater than zero")
        }
        (DiscountType::Percentage | DiscountType::FixedAmount, None) => {
            errors.add("discount_value", "A discount value is required for this discount type")
        }
        _ => {}
    }
}

impl Coupon {
    pub fn create(workspace_id: Uuid, input: NewCoupon, created_by: Uuid) -> Self {
        let discount_value = match input.discount_type {
            DiscountType::Percentage | DiscountType::FixedAmount => input.discount_value,
            DiscountType::Bogo | DiscountType::FreeItem => None,
        };
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            business_id: input.business_id,
            title: input.title.trim().to_string(),
            code: input.code,
            description: normalize_optional(input.description),
            terms: normalize_optional(input.terms),
            discount_type: input.discount_type,
            discount_value,
            start_date: input.start_date,
            end_date: input.end_date,
            usage_limit: input.usage_limit,
            used_count: 0,
            region_ids: super::dedup_ids(input.region_ids),
            status: CouponStatus::Draft,
            rejection_reason: None,
            upvotes: 0,
            downvotes: 0,
            created_at: Utc::now(),
            created_by: Some(created_by),
            modified_at: None,
            removed_at: None,
        }
    }

    /// Applies an update; date order and discount rules are re-checked on the
    /// merged values.
    pub fn apply(&mut self, update: CouponUpdate) -> Result<(), DomainError> {
        let start = update.start_date.unwrap_or(self.start_date);
        let end = update.end_date.unwrap_or(self.end_date);
        let discount_type = update.discount_type.unwrap_or(self.discount_type);
        let discount_value = update.discount_value.or(self.discount_value);

        let mut errors = FieldErrors::default();
        date_order_rule(start, end, &mut errors);
        discount_rule(discount_type, discount_value, &mut errors);
        if let Some(limit) = update.usage_limit {
            if limit < self.used_count {
                errors.add(
                    "usage_limit",
                    format!("Usage limit cannot be lower than the {} claims already made", self.used_count),
                );
            }
        }
        errors.into_result()?;

        if let Some(title) = update.title {
            self.title = title.trim().to_string();
        }
        if update.description.is_some() {
            self.description = normalize_optional(update.description);
        }
        if update.terms.is_some() {
            self.terms = normalize_optional(update.terms);
        }
        if update.usage_limit.is_some() {
            self.usage_limit = update.usage_limit;
        }
        if let Some(region_ids) = update.region_ids {
            self.region_ids = super::dedup_ids(region_ids);
        }
        self.start_date = start;
        self.end_date = end;
        self.discount_type = discount_type;
        self.discount_value = match discount_type {
            DiscountType::Percentage | DiscountType::FixedAmount => discount_value,
            DiscountType::Bogo | DiscountType::FreeItem => None,
        };
        if self.status == CouponStatus::Rejected {
            self.status = CouponStatus::Draft;
            self.rejection_reason = None;
        }
        self.modified_at = Some(Utc::now());
        Ok(())
    }

    pub fn submit(&mut self) -> Result<(), DomainError> {
        match self.status {
            CouponStatus::Draft | CouponStatus::Rejected => {
                self.status = CouponStatus::PendingReview;
                self.rejection_reason = None;
                self.modified_at = Some(Utc::now());
                Ok(())
            }
            other => Err(DomainError::transition("coupon", other, "submit")),
        }
    }

    /// Editors may approve a draft directly or a submitted coupon.
    pub fn approve(&mut self, today: NaiveDate) -> Result<(), DomainError> {
        match self.status {
            CouponStatus::Draft | CouponStatus::PendingReview => {
                if self.end_date < today {
                    return Err(DomainError::transition("coupon", "past its end date", "approve"));
                }
                self.status = CouponStatus::Active;
                self.modified_at = Some(Utc::now());
                Ok(())
            }
            other => Err(DomainError::transition("coupon", other, "approve")),
        }
    }

    pub fn reject(&mut self, reason: &str) -> Result<(), DomainError> {
        match self.status {
            CouponStatus::Draft | CouponStatus::PendingReview | CouponStatus::Active => {
                self.status = CouponStatus::Rejected;
                self.rejection_reason = Some(reason.trim().to_string());
                self.modified_at = Some(Utc::now());
                Ok(())
            }
            other => Err(DomainError::transition("coupon", other, "reject")),
        }
    }

    /// Active coupons whose end date has passed are reported as expired.
    pub fn effective_status(&self, today: NaiveDate) -> CouponStatus {
        if self.status == CouponStatus::Active && self.end_date < today {
            CouponStatus::Expired
        } else {
            self.status
        }
    }

    pub fn is_public(&self, today: NaiveDate) -> bool {
        self.effective_status(today) == CouponStatus::Active && self.removed_at.is_none()
    }

    /// Everything about a claim that does not depend on other claimants.
    pub fn ensure_claimable(&self, today: NaiveDate) -> Result<(), DomainError> {
        match self.effective_status(today) {
            CouponStatus::Active => {}
            CouponStatus::Expired => return Err(DomainError::CouponUnavailable("coupon has expired".into())),
            other => return Err(DomainError::CouponUnavailable(format!("coupon is {}", other))),
        }
        if today < self.start_date {
            return Err(DomainError::CouponUnavailable("coupon is not valid yet".into()));
        }
        if let Some(limit) = self.usage_limit {
            if self.used_count >= limit {
                return Err(DomainError::CouponUnavailable("usage limit reached".into()));
            }
        }
        Ok(())
    }

    pub fn score(&self) -> i32 {
        self.upvotes - self.downvotes
    }

    pub fn ranking(&self) -> f64 {
        wilson_lower_bound(self.upvotes, self.downvotes)
    }

    pub fn apply_vote(&mut self, previous: Option<VoteDirection>, next: VoteDirection) {
        let (up, down) = vote_delta(previous, next);
        self.upvotes += up;
        self.downvotes += down;
    }
}

/// Counter changes for moving one user's vote from `previous` to `next`.
pub fn vote_delta(previous: Option<VoteDirection>, next: VoteDirection) -> (i32, i32) {
    match (previous, next) {
        (Some(p), n) if p == n => (0, 0),
        (None, VoteDirection::Up) => (1, 0),
        (None, VoteDirection::Down) => (0, 1),
        (Some(VoteDirection::Down), VoteDirection::Up) => (1, -1),
        (Some(VoteDirection::Up), VoteDirection::Down) => (-1, 1),
        _ => (0, 0),
    }
}

/// Lower bound of the Wilson score interval at 95% confidence. Ranks a
/// coupon with 40 up / 2 down above one with 2 up / 0 down.
pub fn wilson_lower_bound(upvotes: i32, downvotes: i32) -> f64 {
    let n = (upvotes + downvotes) as f64;
    if n <= 0.0 {
        return 0.0;
    }
    let z = 1.96_f64;
    let phat = upvotes as f64 / n;
    (phat + z * z / (2.0 * n) - z * ((phat * (1.0 - phat) + z * z / (4.0 * n)) / n).sqrt())
        / (1.0 + z * z / n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input() -> NewCoupon {
        NewCoupon {
            business_id: Uuid::new_v4(),
            title: "20% off brunch".into(),
            code: "BRUNCH20".into(),
            description: None,
            terms: None,
            discount_type: DiscountType::Percentage,
            discount_value: Some(20),
            start_date: date(2026, 5, 1),
            end_date: date(2026, 5, 31),
            usage_limit: Some(2),
            region_ids: vec![],
        }
    }

    fn active() -> Coupon {
        let mut coupon = Coupon::create(Uuid::new_v4(), input(), Uuid::new_v4());
        coupon.approve(date(2026, 5, 1)).unwrap();
        coupon
    }

    #[test]
    fn test_end_date_must_be_after_start_date() {
        let mut bad = input();
        bad.end_date = bad.start_date;
        assert_eq!(
            bad.field_errors().get("end_date"),
            Some(&["The end date must be a date after the start date".to_string()][..])
        );
        bad.end_date = date(2026, 4, 1);
        assert!(bad.field_errors().contains("end_date"));
    }

    #[test]
    fn test_discount_value_rules() {
        let mut bad = input();
        bad.discount_value = Some(101);
        assert!(bad.field_errors().contains("discount_value"));

        bad.discount_type = DiscountType::FixedAmount;
        bad.discount_value = Some(0);
        assert!(bad.field_errors().contains("discount_value"));

        bad.discount_value = None;
        assert!(bad.field_errors().contains("discount_value"));

        bad.discount_type = DiscountType::Bogo;
        assert!(bad.check().is_ok());
    }

    #[test]
    fn test_code_format() {
        let mut bad = input();
        bad.code = "brunch 20".into();
        assert!(bad.field_errors().contains("code"));
    }

    #[test]
    fn test_update_rechecks_merged_dates() {
        let mut coupon = active();
        let result = coupon.apply(CouponUpdate { end_date: Some(date(2026, 4, 30)), ..Default::default() });
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(coupon.end_date, date(2026, 5, 31));
    }

    #[test]
    fn test_bogo_drops_value() {
        let mut input = input();
        input.discount_type = DiscountType::Bogo;
        let coupon = Coupon::create(Uuid::new_v4(), input, Uuid::new_v4());
        assert_eq!(coupon.discount_value, None);
    }

    #[test]
    fn test_moderation_workflow() {
        let mut coupon = Coupon::create(Uuid::new_v4(), input(), Uuid::new_v4());
        coupon.submit().unwrap();
        coupon.reject("Code already in print elsewhere").unwrap();
        assert_eq!(coupon.status, CouponStatus::Rejected);
        coupon.apply(CouponUpdate { title: Some("25% off brunch".into()), ..Default::default() }).unwrap();
        assert_eq!(coupon.status, CouponStatus::Draft);
        coupon.submit().unwrap();
        coupon.approve(date(2026, 5, 2)).unwrap();
        assert!(coupon.is_public(date(2026, 5, 2)));
        assert!(!coupon.is_public(date(2026, 6, 1)));
        assert_eq!(coupon.effective_status(date(2026, 6, 1)), CouponStatus::Expired);
    }

    #[test]
    fn test_cannot_approve_past_coupon() {
        let mut coupon = Coupon::create(Uuid::new_v4(), input(), Uuid::new_v4());
        assert!(coupon.approve(date(2026, 6, 1)).is_err());
    }

    #[test]
    fn test_claimable_window_and_limit() {
        let mut coupon = active();
        assert!(coupon.ensure_claimable(date(2026, 4, 30)).is_err());
        assert!(coupon.ensure_claimable(date(2026, 5, 31)).is_ok());
        assert!(coupon.ensure_claimable(date(2026, 6, 1)).is_err());

        coupon.used_count = 2;
        assert!(matches!(
            coupon.ensure_claimable(date(2026, 5, 10)),
            Err(DomainError::CouponUnavailable(_))
        ));
    }

    #[test]
    fn test_vote_delta() {
        assert_eq!(vote_delta(None, VoteDirection::Up), (1, 0));
        assert_eq!(vote_delta(Some(VoteDirection::Up), VoteDirection::Up), (0, 0));
        assert_eq!(vote_delta(Some(VoteDirection::Up), VoteDirection::Down), (-1, 1));
        assert_eq!(vote_delta(Some(VoteDirection::Down), VoteDirection::Up), (1, -1));

        let mut coupon = active();
        coupon.apply_vote(None, VoteDirection::Up);
        coupon.apply_vote(None, VoteDirection::Down);
        coupon.apply_vote(Some(VoteDirection::Down), VoteDirection::Up);
        assert_eq!((coupon.upvotes, coupon.downvotes), (2, 0));
        assert_eq!(coupon.score(), 2);
    }

    #[test]
    fn test_wilson_ranking() {
        assert_eq!(wilson_lower_bound(0, 0), 0.0);
        assert!(wilson_lower_bound(40, 2) > wilson_lower_bound(2, 0));
        assert!(wilson_lower_bound(10, 10) < wilson_lower_bound(15, 5));
        let bound = wilson_lower_bound(100, 0);
        assert!(bound > 0.95 && bound < 1.0);
    }
}
