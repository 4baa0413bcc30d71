// ============================================================================
// LocalHub Infrastructure - PostgreSQL Classified Repository
// File: crates/localhub-infrastructure/src/database/postgres/classified_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use localhub_shared::types::{Page, Pagination};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use localhub_core::domain::{Classified, ClassifiedFilter, ClassifiedStatus, ItemCondition};
use localhub_core::error::DomainError;
use localhub_core::repositories::ClassifiedRepository;

use super::support::{db_error, decode, into_page, like_pattern};

const COLUMNS: &str = "id, workspace_id, user_id, title, description, category, price_cents, condition, \
    contact_email, region_ids, status, rejection_reason, expires_at, created_at, modified_at, removed_at";

/// Active listings past `expires_at` count as expired.
const FILTER: &str = r#"
    workspace_id = $1 AND removed_at IS NULL
    AND ($2::text IS NULL
        OR ($2 = 'active' AND status = 'active' AND expires_at > NOW())
        OR ($2 = 'expired' AND (status = 'expired' OR (status = 'active' AND expires_at <= NOW())))
        OR ($2 NOT IN ('active', 'expired') AND status = $2))
    AND ($3::uuid IS NULL OR $3 = ANY(region_ids))
    AND ($4::text IS NULL OR category = $4)
    AND ($5::uuid IS NULL OR user_id = $5)
    AND ($6::text IS NULL OR title ILIKE $6 OR description ILIKE $6)
"#;

pub struct PgClassifiedRepository {
    pool: PgPool,
}

impl PgClassifiedRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ClassifiedRow {
    id: Uuid,
    workspace_id: Uuid,
    user_id: Uuid,
    title: String,
    description: String,
    category: String,
    price_cents: Option<i64>,
    condition: Option<String>,
    contact_email: String,
    region_ids: Vec<Uuid>,
    status: String,
    rejection_reason: Option<String>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    modified_at: Option<DateTime<Utc>>,
    removed_at: Option<DateTime<Utc>>,
}

impl TryFrom<ClassifiedRow> for Classified {
    type Error = DomainError;

    fn try_from(row: ClassifiedRow) -> Result<Self, Self::Error> {
        Ok(Classified {
            id: row.id,
            workspace_id: row.workspace_id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            category: row.category,
            price_cents: row.price_cents,
            condition: row
                .condition
                .map(|c| decode("condition", &c, ItemCondition::from_str))
                .transpose()?,
            contact_email: row.contact_email,
            region_ids: row.region_ids,
            status: decode("status", &row.status, ClassifiedStatus::from_str)?,
            rejection_reason: row.rejection_reason,
            expires_at: row.expires_at,
            created_at: row.created_at,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        })
    }
}

#[async_trait]
impl ClassifiedRepository for PgClassifiedRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Classified>, DomainError> {
        let row: Option<ClassifiedRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM classifieds WHERE id = $1 AND removed_at IS NULL"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("finding classified by id"))?;

        row.map(Classified::try_from).transpose()
    }

    async fn list(&self, workspace_id: &Uuid, filter: &ClassifiedFilter, pagination: Pagination) -> Result<Page<Classified>, DomainError> {
        let status = filter.status.map(|s| s.as_str());
        let search = like_pattern(&filter.search);

        let rows: Vec<ClassifiedRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM classifieds WHERE {FILTER} ORDER BY created_at DESC, id LIMIT $7 OFFSET $8"
        ))
        .bind(workspace_id)
        .bind(status)
        .bind(filter.region_id)
        .bind(&filter.category)
        .bind(filter.user_id)
        .bind(&search)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing classifieds"))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM classifieds WHERE {FILTER}"))
            .bind(workspace_id)
            .bind(status)
            .bind(filter.region_id)
            .bind(&filter.category)
            .bind(filter.user_id)
            .bind(&search)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting classifieds"))?;

        into_page(rows, pagination, total)
    }

    async fn create(&self, classified: &Classified) -> Result<Classified, DomainError> {
        let row: ClassifiedRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO classifieds (
                id, workspace_id, user_id, title, description, category, price_cents, condition,
                contact_email, region_ids, status, expires_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(classified.id)
        .bind(classified.workspace_id)
        .bind(classified.user_id)
        .bind(&classified.title)
        .bind(&classified.description)
        .bind(&classified.category)
        .bind(classified.price_cents)
        .bind(classified.condition.map(|c| c.as_str()))
        .bind(&classified.contact_email)
        .bind(&classified.region_ids)
        .bind(classified.status.as_str())
        .bind(classified.expires_at)
        .bind(classified.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("creating classified"))?;

        row.try_into()
    }

    async fn update(&self, classified: &Classified) -> Result<Classified, DomainError> {
        let row: ClassifiedRow = sqlx::query_as(&format!(
            r#"
            UPDATE classifieds
            SET title = $2, description = $3, category = $4, price_cents = $5, condition = $6,
                contact_email = $7, region_ids = $8, status = $9, rejection_reason = $10,
                expires_at = $11, modified_at = $12
            WHERE id = $1 AND removed_at IS NULL
            RETURNING {COLUMNS}
            "#
        ))
        .bind(classified.id)
        .bind(&classified.title)
        .bind(&classified.description)
        .bind(&classified.category)
        .bind(classified.price_cents)
        .bind(classified.condition.map(|c| c.as_str()))
        .bind(&classified.contact_email)
        .bind(&classified.region_ids)
        .bind(classified.status.as_str())
        .bind(&classified.rejection_reason)
        .bind(classified.expires_at)
        .bind(classified.modified_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("updating classified"))?
        .ok_or_else(|| DomainError::not_found("classified", classified.id))?;

        row.try_into()
    }

    async fn delete(&self, id: &Uuid) -> Result<(), DomainError> {
        sqlx::query("UPDATE classifieds SET removed_at = NOW() WHERE id = $1 AND removed_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("deleting classified"))?;

        Ok(())
    }
}
