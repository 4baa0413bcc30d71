// ============================================================================
// LocalHub Infrastructure - PostgreSQL Coupon Repository
// File: crates/localhub-infrastructure/src/database/postgres/coupon_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use localhub_shared::types::{Page, Pagination};
use sqlx::{FromRow, PgPool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use localhub_core::domain::{Coupon, CouponClaim, CouponFilter, CouponSort, CouponStatus, DiscountType, VoteDirection};
use localhub_core::error::DomainError;
use localhub_core::repositories::CouponRepository;

use super::support::{db_error, decode, into_page};

const COLUMNS: &str = "id, workspace_id, business_id, title, code, description, terms, discount_type, \
    discount_value, start_date, end_date, usage_limit, used_count, region_ids, status, rejection_reason, \
    upvotes, downvotes, created_at, created_by, modified_at, removed_at";

const CLAIM_COLUMNS: &str = "id, coupon_id, user_id, redemption_code, claimed_at";

/// `$6` is the requested day, `$7` today. An active coupon past its end
/// date is listed as expired.
const FILTER: &str = r#"
    workspace_id = $1 AND removed_at IS NULL
    AND ($2::uuid IS NULL OR business_id = $2)
    AND ($3::text IS NULL
        OR ($3 = 'active' AND status = 'active' AND end_date >= $7)
        OR ($3 = 'expired' AND (status = 'expired' OR (status = 'active' AND end_date < $7)))
        OR ($3 NOT IN ('active', 'expired') AND status = $3))
    AND ($4::uuid IS NULL OR $4 = ANY(region_ids))
    AND ($5::text IS NULL OR discount_type = $5)
    AND ($6::date IS NULL OR (start_date <= $6 AND end_date >= $6))
"#;

/// Wilson score lower bound at 95% confidence, same as `Coupon::ranking`.
const WILSON: &str = "COALESCE((upvotes / n + 1.9208 / n \
    - 1.96 * SQRT((upvotes::float8 * downvotes / (n * n) + 0.9604 / n) / n)) / (1 + 3.8416 / n), 0)";

fn order_by(sort: CouponSort) -> String {
    match sort {
        CouponSort::Newest => "created_at DESC, id".to_string(),
        CouponSort::Popular => format!("{WILSON} DESC, created_at DESC, id"),
        CouponSort::EndingSoon => "end_date ASC, created_at DESC, id".to_string(),
    }
}

pub struct PgCouponRepository {
    pool: PgPool,
}

impl PgCouponRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CouponRow {
    id: Uuid,
    workspace_id: Uuid,
    business_id: Uuid,
    title: String,
    code: String,
    description: Option<String>,
    terms: Option<String>,
    discount_type: String,
    discount_value: Option<i64>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    usage_limit: Option<i32>,
    used_count: i32,
    region_ids: Vec<Uuid>,
    status: String,
    rejection_reason: Option<String>,
    upvotes: i32,
    downvotes: i32,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    modified_at: Option<DateTime<Utc>>,
    removed_at: Option<DateTime<Utc>>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = DomainError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        Ok(Coupon {
            id: row.id,
            workspace_id: row.workspace_id,
            business_id: row.business_id,
            title: row.title,
            code: row.code,
            description: row.description,
            terms: row.terms,
            discount_type: decode("discount_type", &row.discount_type, DiscountType::from_str)?,
            discount_value: row.discount_value,
            start_date: row.start_date,
            end_date: row.end_date,
            usage_limit: row.usage_limit,
            used_count: row.used_count,
            region_ids: row.region_ids,
            status: decode("status", &row.status, CouponStatus::from_str)?,
            rejection_reason: row.rejection_reason,
            upvotes: row.upvotes,
            downvotes: row.downvotes,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ClaimRow {
    id: Uuid,
    coupon_id: Uuid,
    user_id: Uuid,
    redemption_code: String,
    claimed_at: DateTime<Utc>,
}

impl From<ClaimRow> for CouponClaim {
    fn from(row: ClaimRow) -> Self {
        CouponClaim {
            id: row.id,
            coupon_id: row.coupon_id,
            user_id: row.user_id,
            redemption_code: row.redemption_code,
            claimed_at: row.claimed_at,
        }
    }
}

#[async_trait]
impl CouponRepository for PgCouponRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Coupon>, DomainError> {
        let row: Option<CouponRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM coupons WHERE id = $1 AND removed_at IS NULL"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("finding coupon by id"))?;

        row.map(Coupon::try_from).transpose()
    }

    async fn list(
        &self,
        workspace_id: &Uuid,
        filter: &CouponFilter,
        today: NaiveDate,
        pagination: Pagination,
    ) -> Result<Page<Coupon>, DomainError> {
        let status = filter.status.map(|s| s.as_str());
        let discount_type = filter.discount_type.map(|d| d.as_str());

        let rows: Vec<CouponRow> = sqlx::query_as(&format!(
            r#"
            SELECT {COLUMNS}
            FROM coupons
            CROSS JOIN LATERAL (SELECT NULLIF(upvotes + downvotes, 0)::float8 AS n) votes
            WHERE {FILTER}
            ORDER BY {order}
            LIMIT $8 OFFSET $9
            "#,
            order = order_by(filter.sort),
        ))
        .bind(workspace_id)
        .bind(filter.business_id)
        .bind(status)
        .bind(filter.region_id)
        .bind(discount_type)
        .bind(filter.valid_on)
        .bind(today)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing coupons"))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM coupons WHERE {FILTER}"))
            .bind(workspace_id)
            .bind(filter.business_id)
            .bind(status)
            .bind(filter.region_id)
            .bind(discount_type)
            .bind(filter.valid_on)
            .bind(today)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting coupons"))?;

        into_page(rows, pagination, total)
    }

    async fn create(&self, coupon: &Coupon) -> Result<Coupon, DomainError> {
        let row: CouponRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO coupons (
                id, workspace_id, business_id, title, code, description, terms, discount_type, discount_value,
                start_date, end_date, usage_limit, region_ids, status, created_at, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(coupon.id)
        .bind(coupon.workspace_id)
        .bind(coupon.business_id)
        .bind(&coupon.title)
        .bind(&coupon.code)
        .bind(&coupon.description)
        .bind(&coupon.terms)
        .bind(coupon.discount_type.as_str())
        .bind(coupon.discount_value)
        .bind(coupon.start_date)
        .bind(coupon.end_date)
        .bind(coupon.usage_limit)
        .bind(&coupon.region_ids)
        .bind(coupon.status.as_str())
        .bind(coupon.created_at)
        .bind(coupon.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("creating coupon"))?;

        row.try_into()
    }

    async fn update(&self, coupon: &Coupon) -> Result<Coupon, DomainError> {
        // Vote counters and used_count are maintained by cast_vote and claim.
        let row: CouponRow = sqlx::query_as(&format!(
            r#"
            UPDATE coupons
            SET title = $2, code = $3, description = $4, terms = $5, discount_type = $6, discount_value = $7,
                start_date = $8, end_date = $9, usage_limit = $10, region_ids = $11, status = $12,
                rejection_reason = $13, modified_at = $14
            WHERE id = $1 AND removed_at IS NULL
            RETURNING {COLUMNS}
            "#
        ))
        .bind(coupon.id)
        .bind(&coupon.title)
        .bind(&coupon.code)
        .bind(&coupon.description)
        .bind(&coupon.terms)
        .bind(coupon.discount_type.as_str())
        .bind(coupon.discount_value)
        .bind(coupon.start_date)
        .bind(coupon.end_date)
        .bind(coupon.usage_limit)
        .bind(&coupon.region_ids)
        .bind(coupon.status.as_str())
        .bind(&coupon.rejection_reason)
        .bind(coupon.modified_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("updating coupon"))?
        .ok_or_else(|| DomainError::not_found("coupon", coupon.id))?;

        row.try_into()
    }

    async fn delete(&self, id: &Uuid) -> Result<(), DomainError> {
        sqlx::query("UPDATE coupons SET removed_at = NOW() WHERE id = $1 AND removed_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("deleting coupon"))?;

        Ok(())
    }

    async fn cast_vote(&self, coupon_id: &Uuid, user_id: &Uuid, direction: VoteDirection) -> Result<Coupon, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting vote transaction"))?;

        let row: CouponRow = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM coupons WHERE id = $1 AND removed_at IS NULL FOR UPDATE"
        ))
        .bind(coupon_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("locking coupon"))?
        .ok_or_else(|| DomainError::not_found("coupon", coupon_id))?;
        let mut coupon = Coupon::try_from(row)?;

        let previous: Option<String> =
            sqlx::query_scalar("SELECT direction FROM coupon_votes WHERE coupon_id = $1 AND user_id = $2")
                .bind(coupon_id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("loading previous vote"))?;
        let previous = previous
            .map(|d| decode("direction", &d, VoteDirection::from_str))
            .transpose()?;

        if previous == Some(direction) {
            tx.rollback().await.map_err(db_error("rolling back unchanged vote"))?;
            return Ok(coupon);
        }
        coupon.apply_vote(previous, direction);

        sqlx::query(
            r#"
            INSERT INTO coupon_votes (coupon_id, user_id, direction, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (coupon_id, user_id)
            DO UPDATE SET direction = EXCLUDED.direction, modified_at = NOW()
            "#,
        )
        .bind(coupon_id)
        .bind(user_id)
        .bind(direction.as_str())
        .execute(&mut *tx)
        .await
        .map_err(db_error("saving vote"))?;

        let row: CouponRow = sqlx::query_as(&format!(
            "UPDATE coupons SET upvotes = $2, downvotes = $3 WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(coupon_id)
        .bind(coupon.upvotes)
        .bind(coupon.downvotes)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("updating vote counts"))?;

        tx.commit().await.map_err(db_error("committing vote"))?;

        debug!(%coupon_id, %user_id, direction = %direction, "Coupon vote recorded");
        row.try_into()
    }

    async fn claim(&self, claim: &CouponClaim) -> Result<CouponClaim, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting claim transaction"))?;

        let reserved = sqlx::query(
            r#"
            UPDATE coupons SET used_count = used_count + 1
            WHERE id = $1 AND removed_at IS NULL
              AND (usage_limit IS NULL OR used_count + 1 <= usage_limit)
            "#,
        )
        .bind(claim.coupon_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error("reserving coupon use"))?;

        if reserved.rows_affected() == 0 {
            warn!(coupon_id = %claim.coupon_id, "Coupon claim missed the usage limit");
            return Err(DomainError::CouponUnavailable("usage limit reached".into()));
        }

        let row: ClaimRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO coupon_claims (id, coupon_id, user_id, redemption_code, claimed_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CLAIM_COLUMNS}
            "#
        ))
        .bind(claim.id)
        .bind(claim.coupon_id)
        .bind(claim.user_id)
        .bind(&claim.redemption_code)
        .bind(claim.claimed_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("recording coupon claim"))?;

        tx.commit().await.map_err(db_error("committing claim"))?;

        info!(coupon_id = %claim.coupon_id, user_id = %claim.user_id, "Coupon claimed");
        Ok(row.into())
    }

    async fn find_claim(&self, coupon_id: &Uuid, user_id: &Uuid) -> Result<Option<CouponClaim>, DomainError> {
        let row: Option<ClaimRow> = sqlx::query_as(&format!(
            "SELECT {CLAIM_COLUMNS} FROM coupon_claims WHERE coupon_id = $1 AND user_id = $2"
        ))
        .bind(coupon_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding coupon claim"))?;

        Ok(row.map(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popular_sort_orders_by_wilson_bound() {
        assert!(order_by(CouponSort::Popular).starts_with("COALESCE("));
        assert_eq!(order_by(CouponSort::EndingSoon), "end_date ASC, created_at DESC, id");
    }
}
