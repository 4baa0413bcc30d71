// ============================================================================
// LocalHub Infrastructure - PostgreSQL Workspace & Member Repositories
// File: crates/localhub-infrastructure/src/database/postgres/workspace_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use localhub_shared::types::{Page, Pagination};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use localhub_core::domain::{Workspace, WorkspaceMember, WorkspaceRole};
use localhub_core::error::DomainError;
use localhub_core::repositories::{MemberRepository, WorkspaceRepository};

use super::support::{db_error, decode, into_page};

const WORKSPACE_COLUMNS: &str =
    "id, tenant_id, name, slug, description, is_active, created_at, created_by, modified_at, removed_at";
const MEMBER_COLUMNS: &str = "id, workspace_id, user_id, role, joined_at, invited_by, modified_at";

pub struct PgWorkspaceRepository {
    pool: PgPool,
}

impl PgWorkspaceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub struct PgMemberRepository {
    pool: PgPool,
}

impl PgMemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct WorkspaceRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    modified_at: Option<DateTime<Utc>>,
    removed_at: Option<DateTime<Utc>>,
}

impl TryFrom<WorkspaceRow> for Workspace {
    type Error = DomainError;

    fn try_from(row: WorkspaceRow) -> Result<Self, Self::Error> {
        Ok(Workspace {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct MemberRow {
    id: Uuid,
    workspace_id: Uuid,
    user_id: Uuid,
    role: String,
    joined_at: DateTime<Utc>,
    invited_by: Option<Uuid>,
    modified_at: Option<DateTime<Utc>>,
}

impl TryFrom<MemberRow> for WorkspaceMember {
    type Error = DomainError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        Ok(WorkspaceMember {
            id: row.id,
            workspace_id: row.workspace_id,
            user_id: row.user_id,
            role: decode("role", &row.role, WorkspaceRole::from_str)?,
            joined_at: row.joined_at,
            invited_by: row.invited_by,
            modified_at: row.modified_at,
        })
    }
}

#[async_trait]
impl WorkspaceRepository for PgWorkspaceRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Workspace>, DomainError> {
        let row: Option<WorkspaceRow> = sqlx::query_as(&format!(
            "SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE id = $1 AND removed_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding workspace by id"))?;

        row.map(Workspace::try_from).transpose()
    }

    async fn count_by_tenant(&self, tenant_id: &Uuid) -> Result<i64, DomainError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM workspaces WHERE tenant_id = $1 AND removed_at IS NULL")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting tenant workspaces"))
    }

    async fn list_by_tenant(&self, tenant_id: &Uuid, pagination: Pagination) -> Result<Page<Workspace>, DomainError> {
        let rows: Vec<WorkspaceRow> = sqlx::query_as(&format!(
            r#"
            SELECT {WORKSPACE_COLUMNS} FROM workspaces
            WHERE tenant_id = $1 AND removed_at IS NULL
            ORDER BY name
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(tenant_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing tenant workspaces"))?;

        let total = self.count_by_tenant(tenant_id).await?;
        into_page(rows, pagination, total)
    }

    async fn list_for_user(&self, user_id: &Uuid, pagination: Pagination) -> Result<Page<Workspace>, DomainError> {
        let rows: Vec<WorkspaceRow> = sqlx::query_as(
            r#"
            SELECT w.id, w.tenant_id, w.name, w.slug, w.description, w.is_active,
                   w.created_at, w.created_by, w.modified_at, w.removed_at
            FROM workspaces w
            JOIN workspace_members m ON m.workspace_id = w.id
            WHERE m.user_id = $1 AND w.removed_at IS NULL
            ORDER BY w.name
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing user workspaces"))?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM workspaces w
            JOIN workspace_members m ON m.workspace_id = w.id
            WHERE m.user_id = $1 AND w.removed_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("counting user workspaces"))?;

        into_page(rows, pagination, total)
    }

    async fn create_with_owner(&self, workspace: &Workspace, owner: &WorkspaceMember) -> Result<Workspace, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting workspace transaction"))?;

        let row: WorkspaceRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO workspaces (id, tenant_id, name, slug, description, is_active, created_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {WORKSPACE_COLUMNS}
            "#
        ))
        .bind(workspace.id)
        .bind(workspace.tenant_id)
        .bind(&workspace.name)
        .bind(&workspace.slug)
        .bind(&workspace.description)
        .bind(workspace.is_active)
        .bind(workspace.created_at)
        .bind(workspace.created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("creating workspace"))?;

        sqlx::query(
            r#"
            INSERT INTO workspace_members (id, workspace_id, user_id, role, joined_at, invited_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(owner.id)
        .bind(owner.workspace_id)
        .bind(owner.user_id)
        .bind(owner.role.as_str())
        .bind(owner.joined_at)
        .bind(owner.invited_by)
        .execute(&mut *tx)
        .await
        .map_err(db_error("adding workspace owner"))?;

        tx.commit().await.map_err(db_error("committing workspace"))?;
        info!(workspace_id = %row.id, owner_id = %owner.user_id, "Workspace row inserted with owner");
        row.try_into()
    }

    async fn update(&self, workspace: &Workspace) -> Result<Workspace, DomainError> {
        let row: WorkspaceRow = sqlx::query_as(&format!(
            r#"
            UPDATE workspaces
            SET name = $2, description = $3, is_active = $4, modified_at = $5, removed_at = $6
            WHERE id = $1
            RETURNING {WORKSPACE_COLUMNS}
            "#
        ))
        .bind(workspace.id)
        .bind(&workspace.name)
        .bind(&workspace.description)
        .bind(workspace.is_active)
        .bind(workspace.modified_at)
        .bind(workspace.removed_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("updating workspace"))?
        .ok_or_else(|| DomainError::not_found("workspace", workspace.id))?;

        row.try_into()
    }
}

#[async_trait]
impl MemberRepository for PgMemberRepository {
    async fn find(&self, workspace_id: &Uuid, user_id: &Uuid) -> Result<Option<WorkspaceMember>, DomainError> {
        let row: Option<MemberRow> = sqlx::query_as(&format!(
            "SELECT {MEMBER_COLUMNS} FROM workspace_members WHERE workspace_id = $1 AND user_id = $2"
        ))
        .bind(workspace_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding workspace member"))?;

        row.map(WorkspaceMember::try_from).transpose()
    }

    async fn list(&self, workspace_id: &Uuid, pagination: Pagination) -> Result<Page<WorkspaceMember>, DomainError> {
        let rows: Vec<MemberRow> = sqlx::query_as(&format!(
            r#"
            SELECT {MEMBER_COLUMNS} FROM workspace_members
            WHERE workspace_id = $1
            ORDER BY joined_at
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(workspace_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing workspace members"))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workspace_members WHERE workspace_id = $1")
            .bind(workspace_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting workspace members"))?;

        into_page(rows, pagination, total)
    }

    async fn add(&self, member: &WorkspaceMember) -> Result<WorkspaceMember, DomainError> {
        let row: MemberRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO workspace_members (id, workspace_id, user_id, role, joined_at, invited_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(member.id)
        .bind(member.workspace_id)
        .bind(member.user_id)
        .bind(member.role.as_str())
        .bind(member.joined_at)
        .bind(member.invited_by)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("adding workspace member"))?;

        row.try_into()
    }

    async fn update_role(&self, member: &WorkspaceMember) -> Result<WorkspaceMember, DomainError> {
        let row: MemberRow = sqlx::query_as(&format!(
            r#"
            UPDATE workspace_members SET role = $3, modified_at = $4
            WHERE workspace_id = $1 AND user_id = $2
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(member.workspace_id)
        .bind(member.user_id)
        .bind(member.role.as_str())
        .bind(member.modified_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("changing member role"))?
        .ok_or_else(|| DomainError::not_found("workspace member", member.user_id))?;

        row.try_into()
    }

    async fn remove(&self, workspace_id: &Uuid, user_id: &Uuid) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM workspace_members WHERE workspace_id = $1 AND user_id = $2")
            .bind(workspace_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("removing workspace member"))?;

        Ok(())
    }

    async fn count_owners(&self, workspace_id: &Uuid) -> Result<i64, DomainError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM workspace_members WHERE workspace_id = $1 AND role = 'owner'")
            .bind(workspace_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting workspace owners"))
    }

    async fn find_non_members(&self, workspace_id: &Uuid, user_ids: &[Uuid]) -> Result<Vec<Uuid>, DomainError> {
        sqlx::query_scalar(
            r#"
            SELECT u.id FROM UNNEST($2::uuid[]) AS u(id)
            WHERE NOT EXISTS (
                SELECT 1 FROM workspace_members m WHERE m.workspace_id = $1 AND m.user_id = u.id
            )
            "#,
        )
        .bind(workspace_id)
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("checking workspace membership"))
    }
}
