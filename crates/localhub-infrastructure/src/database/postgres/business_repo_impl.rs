// ============================================================================
// LocalHub Infrastructure - PostgreSQL Business Repository
// File: crates/localhub-infrastructure/src/database/postgres/business_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use localhub_shared::types::{Page, Pagination};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use localhub_core::domain::{Business, BusinessFilter, BusinessStatus};
use localhub_core::error::DomainError;
use localhub_core::repositories::BusinessRepository;

use super::support::{db_error, decode, into_page, like_pattern};

const COLUMNS: &str = "id, workspace_id, name, slug, description, category, email, phone, website, address, \
    region_ids, status, claimed_by, claimed_at, is_verified, verified_at, follower_count, \
    created_at, created_by, modified_at, removed_at";

const FILTER: &str = r#"
    workspace_id = $1 AND removed_at IS NULL
    AND ($2::uuid IS NULL OR $2 = ANY(region_ids))
    AND ($3::text IS NULL OR category = $3)
    AND ($4::text IS NULL OR name ILIKE $4 OR description ILIKE $4)
    AND ($5::text IS NULL OR status = $5)
    AND ($6::bool IS NULL OR is_verified = $6)
"#;

pub struct PgBusinessRepository {
    pool: PgPool,
}

impl PgBusinessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct BusinessRow {
    id: Uuid,
    workspace_id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    category: String,
    email: Option<String>,
    phone: Option<String>,
    website: Option<String>,
    address: Option<String>,
    region_ids: Vec<Uuid>,
    status: String,
    claimed_by: Option<Uuid>,
    claimed_at: Option<DateTime<Utc>>,
    is_verified: bool,
    verified_at: Option<DateTime<Utc>>,
    follower_count: i64,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    modified_at: Option<DateTime<Utc>>,
    removed_at: Option<DateTime<Utc>>,
}

impl TryFrom<BusinessRow> for Business {
    type Error = DomainError;

    fn try_from(row: BusinessRow) -> Result<Self, Self::Error> {
        Ok(Business {
            id: row.id,
            workspace_id: row.workspace_id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            category: row.category,
            email: row.email,
            phone: row.phone,
            website: row.website,
            address: row.address,
            region_ids: row.region_ids,
            status: decode("status", &row.status, BusinessStatus::from_str)?,
            claimed_by: row.claimed_by,
            claimed_at: row.claimed_at,
            is_verified: row.is_verified,
            verified_at: row.verified_at,
            follower_count: row.follower_count,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        })
    }
}

#[async_trait]
impl BusinessRepository for PgBusinessRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Business>, DomainError> {
        let row: Option<BusinessRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM businesses WHERE id = $1 AND removed_at IS NULL"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("finding business by id"))?;

        row.map(Business::try_from).transpose()
    }

    async fn list(&self, workspace_id: &Uuid, filter: &BusinessFilter, pagination: Pagination) -> Result<Page<Business>, DomainError> {
        let status = filter.status.map(|s| s.as_str());
        let search = like_pattern(&filter.search);

        let rows: Vec<BusinessRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM businesses WHERE {FILTER} ORDER BY name LIMIT $7 OFFSET $8"
        ))
        .bind(workspace_id)
        .bind(filter.region_id)
        .bind(&filter.category)
        .bind(&search)
        .bind(status)
        .bind(filter.verified)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing businesses"))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM businesses WHERE {FILTER}"))
            .bind(workspace_id)
            .bind(filter.region_id)
            .bind(&filter.category)
            .bind(&search)
            .bind(status)
            .bind(filter.verified)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting businesses"))?;

        into_page(rows, pagination, total)
    }

    async fn create(&self, business: &Business) -> Result<Business, DomainError> {
        let row: BusinessRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO businesses (
                id, workspace_id, name, slug, description, category, email, phone, website, address,
                region_ids, status, is_verified, created_at, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(business.id)
        .bind(business.workspace_id)
        .bind(&business.name)
        .bind(&business.slug)
        .bind(&business.description)
        .bind(&business.category)
        .bind(&business.email)
        .bind(&business.phone)
        .bind(&business.website)
        .bind(&business.address)
        .bind(&business.region_ids)
        .bind(business.status.as_str())
        .bind(business.is_verified)
        .bind(business.created_at)
        .bind(business.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("creating business"))?;

        row.try_into()
    }

    async fn update(&self, business: &Business) -> Result<Business, DomainError> {
        let row: BusinessRow = sqlx::query_as(&format!(
            r#"
            UPDATE businesses
            SET name = $2, description = $3, category = $4, email = $5, phone = $6, website = $7,
                address = $8, region_ids = $9, status = $10, is_verified = $11, verified_at = $12,
                modified_at = $13
            WHERE id = $1 AND removed_at IS NULL
            RETURNING {COLUMNS}
            "#
        ))
        .bind(business.id)
        .bind(&business.name)
        .bind(&business.description)
        .bind(&business.category)
        .bind(&business.email)
        .bind(&business.phone)
        .bind(&business.website)
        .bind(&business.address)
        .bind(&business.region_ids)
        .bind(business.status.as_str())
        .bind(business.is_verified)
        .bind(business.verified_at)
        .bind(business.modified_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("updating business"))?
        .ok_or_else(|| DomainError::not_found("business", business.id))?;

        row.try_into()
    }

    async fn delete(&self, id: &Uuid) -> Result<(), DomainError> {
        sqlx::query("UPDATE businesses SET removed_at = NOW() WHERE id = $1 AND removed_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("deleting business"))?;

        Ok(())
    }

    async fn claim(&self, id: &Uuid, user_id: &Uuid, at: DateTime<Utc>) -> Result<Option<Business>, DomainError> {
        // Conditional update: only the first claimant wins.
        let row: Option<BusinessRow> = sqlx::query_as(&format!(
            r#"
            UPDATE businesses
            SET claimed_by = $2, claimed_at = $3, modified_at = $3
            WHERE id = $1 AND claimed_by IS NULL AND removed_at IS NULL
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("claiming business"))?;

        if row.is_some() {
            info!(business_id = %id, %user_id, "Business claim recorded");
        }
        row.map(Business::try_from).transpose()
    }
}
