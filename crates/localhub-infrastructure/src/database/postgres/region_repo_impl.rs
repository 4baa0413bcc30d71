// ============================================================================
// LocalHub Infrastructure - PostgreSQL Region Repository
// File: crates/localhub-infrastructure/src/database/postgres/region_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use localhub_shared::types::{Page, Pagination};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use localhub_core::domain::{Region, RegionFilter, RegionKind};
use localhub_core::error::DomainError;
use localhub_core::repositories::RegionRepository;

use super::support::{db_error, decode, into_page, like_pattern};

const COLUMNS: &str = "id, parent_id, kind, name, slug, latitude, longitude, created_at, modified_at";

const FILTER: &str = r#"
    ($1::text IS NULL OR kind = $1)
    AND ($2::uuid IS NULL OR parent_id = $2)
    AND ($3::text IS NULL OR name ILIKE $3)
"#;

pub struct PgRegionRepository {
    pool: PgPool,
}

impl PgRegionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RegionRow {
    id: Uuid,
    parent_id: Option<Uuid>,
    kind: String,
    name: String,
    slug: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    created_at: DateTime<Utc>,
    modified_at: Option<DateTime<Utc>>,
}

impl TryFrom<RegionRow> for Region {
    type Error = DomainError;

    fn try_from(row: RegionRow) -> Result<Self, Self::Error> {
        Ok(Region {
            id: row.id,
            parent_id: row.parent_id,
            kind: decode("kind", &row.kind, RegionKind::from_str)?,
            name: row.name,
            slug: row.slug,
            latitude: row.latitude,
            longitude: row.longitude,
            created_at: row.created_at,
            modified_at: row.modified_at,
        })
    }
}

#[async_trait]
impl RegionRepository for PgRegionRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Region>, DomainError> {
        let row: Option<RegionRow> = sqlx::query_as(&format!("SELECT {COLUMNS} FROM regions WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("finding region by id"))?;

        row.map(Region::try_from).transpose()
    }

    async fn list(&self, filter: &RegionFilter, pagination: Pagination) -> Result<Page<Region>, DomainError> {
        let kind = filter.kind.map(|k| k.as_str());
        let search = like_pattern(&filter.search);

        let rows: Vec<RegionRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM regions WHERE {FILTER} ORDER BY name LIMIT $4 OFFSET $5"
        ))
        .bind(kind)
        .bind(filter.parent_id)
        .bind(&search)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing regions"))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM regions WHERE {FILTER}"))
            .bind(kind)
            .bind(filter.parent_id)
            .bind(&search)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting regions"))?;

        into_page(rows, pagination, total)
    }

    async fn create(&self, region: &Region) -> Result<Region, DomainError> {
        let row: RegionRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO regions (id, parent_id, kind, name, slug, latitude, longitude, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(region.id)
        .bind(region.parent_id)
        .bind(region.kind.as_str())
        .bind(&region.name)
        .bind(&region.slug)
        .bind(region.latitude)
        .bind(region.longitude)
        .bind(region.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("creating region"))?;

        row.try_into()
    }

    async fn update(&self, region: &Region) -> Result<Region, DomainError> {
        let row: RegionRow = sqlx::query_as(&format!(
            r#"
            UPDATE regions
            SET parent_id = $2, name = $3, slug = $4, latitude = $5, longitude = $6, modified_at = $7
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(region.id)
        .bind(region.parent_id)
        .bind(&region.name)
        .bind(&region.slug)
        .bind(region.latitude)
        .bind(region.longitude)
        .bind(region.modified_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("updating region"))?
        .ok_or_else(|| DomainError::not_found("region", region.id))?;

        row.try_into()
    }

    async fn delete(&self, id: &Uuid) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM regions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("deleting region"))?;

        Ok(())
    }

    async fn count_children(&self, id: &Uuid) -> Result<i64, DomainError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM regions WHERE parent_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting child regions"))
    }

    async fn find_missing(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, DomainError> {
        sqlx::query_scalar(
            r#"
            SELECT r.id FROM UNNEST($1::uuid[]) AS r(id)
            WHERE NOT EXISTS (SELECT 1 FROM regions WHERE regions.id = r.id)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("checking region references"))
    }
}
