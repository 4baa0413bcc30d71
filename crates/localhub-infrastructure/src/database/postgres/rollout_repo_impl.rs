// ============================================================================
// LocalHub Infrastructure - PostgreSQL Rollout Repository
// File: crates/localhub-infrastructure/src/database/postgres/rollout_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use localhub_shared::types::{Page, Pagination};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use localhub_core::domain::{Rollout, RolloutStatus};
use localhub_core::error::DomainError;
use localhub_core::repositories::RolloutRepository;

use super::support::{db_error, decode, into_page};

const COLUMNS: &str = "id, workspace_id, name, feature_key, description, status, current_percentage, \
    target_percentage, step_percentage, started_at, paused_at, completed_at, created_at, created_by, modified_at";

pub struct PgRolloutRepository {
    pool: PgPool,
}

impl PgRolloutRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RolloutRow {
    id: Uuid,
    workspace_id: Uuid,
    name: String,
    feature_key: String,
    description: Option<String>,
    status: String,
    current_percentage: i32,
    target_percentage: i32,
    step_percentage: i32,
    started_at: Option<DateTime<Utc>>,
    paused_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    modified_at: Option<DateTime<Utc>>,
}

impl TryFrom<RolloutRow> for Rollout {
    type Error = DomainError;

    fn try_from(row: RolloutRow) -> Result<Self, Self::Error> {
        Ok(Rollout {
            id: row.id,
            workspace_id: row.workspace_id,
            name: row.name,
            feature_key: row.feature_key,
            description: row.description,
            status: decode("status", &row.status, RolloutStatus::from_str)?,
            current_percentage: row.current_percentage,
            target_percentage: row.target_percentage,
            step_percentage: row.step_percentage,
            started_at: row.started_at,
            paused_at: row.paused_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
        })
    }
}

#[async_trait]
impl RolloutRepository for PgRolloutRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Rollout>, DomainError> {
        let row: Option<RolloutRow> = sqlx::query_as(&format!("SELECT {COLUMNS} FROM rollouts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("finding rollout by id"))?;

        row.map(Rollout::try_from).transpose()
    }

    async fn list(&self, workspace_id: &Uuid, pagination: Pagination) -> Result<Page<Rollout>, DomainError> {
        let rows: Vec<RolloutRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM rollouts WHERE workspace_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(workspace_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing rollouts"))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rollouts WHERE workspace_id = $1")
            .bind(workspace_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting rollouts"))?;

        into_page(rows, pagination, total)
    }

    async fn create(&self, rollout: &Rollout) -> Result<Rollout, DomainError> {
        let row: RolloutRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO rollouts (
                id, workspace_id, name, feature_key, description, status, current_percentage,
                target_percentage, step_percentage, created_at, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(rollout.id)
        .bind(rollout.workspace_id)
        .bind(&rollout.name)
        .bind(&rollout.feature_key)
        .bind(&rollout.description)
        .bind(rollout.status.as_str())
        .bind(rollout.current_percentage)
        .bind(rollout.target_percentage)
        .bind(rollout.step_percentage)
        .bind(rollout.created_at)
        .bind(rollout.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("creating rollout"))?;

        row.try_into()
    }

    async fn update(&self, rollout: &Rollout) -> Result<Rollout, DomainError> {
        let row: RolloutRow = sqlx::query_as(&format!(
            r#"
            UPDATE rollouts
            SET name = $2, description = $3, status = $4, current_percentage = $5, target_percentage = $6,
                step_percentage = $7, started_at = $8, paused_at = $9, completed_at = $10, modified_at = $11
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(rollout.id)
        .bind(&rollout.name)
        .bind(&rollout.description)
        .bind(rollout.status.as_str())
        .bind(rollout.current_percentage)
        .bind(rollout.target_percentage)
        .bind(rollout.step_percentage)
        .bind(rollout.started_at)
        .bind(rollout.paused_at)
        .bind(rollout.completed_at)
        .bind(rollout.modified_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("updating rollout"))?
        .ok_or_else(|| DomainError::not_found("rollout", rollout.id))?;

        row.try_into()
    }

    async fn delete(&self, id: &Uuid) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM rollouts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("deleting rollout"))?;

        Ok(())
    }
}
