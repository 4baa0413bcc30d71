// ============================================================================
// LocalHub Infrastructure - PostgreSQL Organization Repository
// File: crates/localhub-infrastructure/src/database/postgres/organization_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use localhub_shared::types::{Page, Pagination};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use localhub_core::domain::{Organization, OrganizationFilter, OrganizationKind};
use localhub_core::error::DomainError;
use localhub_core::repositories::OrganizationRepository;

use super::support::{db_error, decode, into_page, like_pattern};

const COLUMNS: &str = "id, workspace_id, name, slug, kind, description, website, email, region_ids, \
    follower_count, created_at, created_by, modified_at, removed_at";

const FILTER: &str = r#"
    workspace_id = $1 AND removed_at IS NULL
    AND ($2::text IS NULL OR kind = $2)
    AND ($3::uuid IS NULL OR $3 = ANY(region_ids))
    AND ($4::text IS NULL OR name ILIKE $4 OR description ILIKE $4)
"#;

pub struct PgOrganizationRepository {
    pool: PgPool,
}

impl PgOrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct OrganizationRow {
    id: Uuid,
    workspace_id: Uuid,
    name: String,
    slug: String,
    kind: String,
    description: Option<String>,
    website: Option<String>,
    email: Option<String>,
    region_ids: Vec<Uuid>,
    follower_count: i64,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    modified_at: Option<DateTime<Utc>>,
    removed_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrganizationRow> for Organization {
    type Error = DomainError;

    fn try_from(row: OrganizationRow) -> Result<Self, Self::Error> {
        Ok(Organization {
            id: row.id,
            workspace_id: row.workspace_id,
            name: row.name,
            slug: row.slug,
            kind: decode("kind", &row.kind, OrganizationKind::from_str)?,
            description: row.description,
            website: row.website,
            email: row.email,
            region_ids: row.region_ids,
            follower_count: row.follower_count,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        })
    }
}

#[async_trait]
impl OrganizationRepository for PgOrganizationRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Organization>, DomainError> {
        let row: Option<OrganizationRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM organizations WHERE id = $1 AND removed_at IS NULL"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("finding organization by id"))?;

        row.map(Organization::try_from).transpose()
    }

    async fn list(&self, workspace_id: &Uuid, filter: &OrganizationFilter, pagination: Pagination) -> Result<Page<Organization>, DomainError> {
        let kind = filter.kind.map(|k| k.as_str());
        let search = like_pattern(&filter.search);

        let rows: Vec<OrganizationRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM organizations WHERE {FILTER} ORDER BY name LIMIT $5 OFFSET $6"
        ))
        .bind(workspace_id)
        .bind(kind)
        .bind(filter.region_id)
        .bind(&search)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing organizations"))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM organizations WHERE {FILTER}"))
            .bind(workspace_id)
            .bind(kind)
            .bind(filter.region_id)
            .bind(&search)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting organizations"))?;

        into_page(rows, pagination, total)
    }

    async fn create(&self, organization: &Organization) -> Result<Organization, DomainError> {
        let row: OrganizationRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO organizations (
                id, workspace_id, name, slug, kind, description, website, email, region_ids,
                created_at, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(organization.id)
        .bind(organization.workspace_id)
        .bind(&organization.name)
        .bind(&organization.slug)
        .bind(organization.kind.as_str())
        .bind(&organization.description)
        .bind(&organization.website)
        .bind(&organization.email)
        .bind(&organization.region_ids)
        .bind(organization.created_at)
        .bind(organization.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("creating organization"))?;

        row.try_into()
    }

    async fn update(&self, organization: &Organization) -> Result<Organization, DomainError> {
        let row: OrganizationRow = sqlx::query_as(&format!(
            r#"
            UPDATE organizations
            SET name = $2, kind = $3, description = $4, website = $5, email = $6, region_ids = $7,
                modified_at = $8
            WHERE id = $1 AND removed_at IS NULL
            RETURNING {COLUMNS}
            "#
        ))
        .bind(organization.id)
        .bind(&organization.name)
        .bind(organization.kind.as_str())
        .bind(&organization.description)
        .bind(&organization.website)
        .bind(&organization.email)
        .bind(&organization.region_ids)
        .bind(organization.modified_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("updating organization"))?
        .ok_or_else(|| DomainError::not_found("organization", organization.id))?;

        row.try_into()
    }

    async fn delete(&self, id: &Uuid) -> Result<(), DomainError> {
        sqlx::query("UPDATE organizations SET removed_at = NOW() WHERE id = $1 AND removed_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("deleting organization"))?;

        Ok(())
    }
}
