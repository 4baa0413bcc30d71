// ============================================================================
// LocalHub Infrastructure - PostgreSQL Tenant Repository
// File: crates/localhub-infrastructure/src/database/postgres/tenant_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use localhub_shared::types::{Page, Pagination};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use localhub_core::domain::{SubscriptionPlan, Tenant};
use localhub_core::error::DomainError;
use localhub_core::repositories::TenantRepository;

use super::support::{db_error, decode, into_page};

const COLUMNS: &str = "id, name, slug, description, is_active, plan, max_workspaces, \
    created_at, created_by, modified_at, modified_by, removed_at, removed_by";

pub struct PgTenantRepository {
    pool: PgPool,
}

impl PgTenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TenantRow {
    id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    is_active: bool,
    plan: String,
    max_workspaces: i32,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    modified_at: Option<DateTime<Utc>>,
    modified_by: Option<Uuid>,
    removed_at: Option<DateTime<Utc>>,
    removed_by: Option<Uuid>,
}

impl TryFrom<TenantRow> for Tenant {
    type Error = DomainError;

    fn try_from(row: TenantRow) -> Result<Self, Self::Error> {
        Ok(Tenant {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            is_active: row.is_active,
            plan: decode("plan", &row.plan, SubscriptionPlan::from_str)?,
            max_workspaces: row.max_workspaces,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            modified_by: row.modified_by,
            removed_at: row.removed_at,
            removed_by: row.removed_by,
        })
    }
}

#[async_trait]
impl TenantRepository for PgTenantRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Tenant>, DomainError> {
        let row: Option<TenantRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM tenants WHERE id = $1 AND removed_at IS NULL"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("finding tenant by id"))?;

        row.map(Tenant::try_from).transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, DomainError> {
        let row: Option<TenantRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM tenants WHERE slug = $1 AND removed_at IS NULL"))
                .bind(slug)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("finding tenant by slug"))?;

        row.map(Tenant::try_from).transpose()
    }

    async fn list(&self, pagination: Pagination) -> Result<Page<Tenant>, DomainError> {
        let rows: Vec<TenantRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM tenants WHERE removed_at IS NULL ORDER BY name LIMIT $1 OFFSET $2"
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing tenants"))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenants WHERE removed_at IS NULL")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting tenants"))?;

        into_page(rows, pagination, total)
    }

    async fn create(&self, tenant: &Tenant) -> Result<Tenant, DomainError> {
        let row: TenantRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO tenants (id, name, slug, description, is_active, plan, max_workspaces, created_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(tenant.id)
        .bind(&tenant.name)
        .bind(&tenant.slug)
        .bind(&tenant.description)
        .bind(tenant.is_active)
        .bind(tenant.plan.as_str())
        .bind(tenant.max_workspaces)
        .bind(tenant.created_at)
        .bind(tenant.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("creating tenant"))?;

        row.try_into()
    }

    async fn update(&self, tenant: &Tenant) -> Result<Tenant, DomainError> {
        let row: TenantRow = sqlx::query_as(&format!(
            r#"
            UPDATE tenants
            SET name = $2, description = $3, is_active = $4, plan = $5, max_workspaces = $6,
                modified_at = $7, modified_by = $8, removed_at = $9, removed_by = $10
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(tenant.id)
        .bind(&tenant.name)
        .bind(&tenant.description)
        .bind(tenant.is_active)
        .bind(tenant.plan.as_str())
        .bind(tenant.max_workspaces)
        .bind(tenant.modified_at)
        .bind(tenant.modified_by)
        .bind(tenant.removed_at)
        .bind(tenant.removed_by)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("updating tenant"))?
        .ok_or_else(|| DomainError::not_found("tenant", tenant.id))?;

        row.try_into()
    }
}
