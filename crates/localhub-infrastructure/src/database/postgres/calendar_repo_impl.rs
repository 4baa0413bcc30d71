// ============================================================================
// LocalHub Infrastructure - PostgreSQL Calendar Repository
// File: crates/localhub-infrastructure/src/database/postgres/calendar_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use localhub_shared::types::{Page, Pagination};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use localhub_core::domain::Calendar;
use localhub_core::error::DomainError;
use localhub_core::repositories::CalendarRepository;

use super::support::{db_error, into_page};

const COLUMNS: &str =
    "id, workspace_id, name, description, is_public, follower_count, created_at, created_by, modified_at, removed_at";

const FILTER: &str = "workspace_id = $1 AND removed_at IS NULL AND (NOT $2 OR is_public)";

pub struct PgCalendarRepository {
    pool: PgPool,
}

impl PgCalendarRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CalendarRow {
    id: Uuid,
    workspace_id: Uuid,
    name: String,
    description: Option<String>,
    is_public: bool,
    follower_count: i64,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    modified_at: Option<DateTime<Utc>>,
    removed_at: Option<DateTime<Utc>>,
}

impl TryFrom<CalendarRow> for Calendar {
    type Error = DomainError;

    fn try_from(row: CalendarRow) -> Result<Self, Self::Error> {
        Ok(Calendar {
            id: row.id,
            workspace_id: row.workspace_id,
            name: row.name,
            description: row.description,
            is_public: row.is_public,
            follower_count: row.follower_count,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        })
    }
}

#[async_trait]
impl CalendarRepository for PgCalendarRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Calendar>, DomainError> {
        let row: Option<CalendarRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM calendars WHERE id = $1 AND removed_at IS NULL"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("finding calendar by id"))?;

        row.map(Calendar::try_from).transpose()
    }

    async fn list(&self, workspace_id: &Uuid, public_only: bool, pagination: Pagination) -> Result<Page<Calendar>, DomainError> {
        let rows: Vec<CalendarRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM calendars WHERE {FILTER} ORDER BY name LIMIT $3 OFFSET $4"))
                .bind(workspace_id)
                .bind(public_only)
                .bind(pagination.limit())
                .bind(pagination.offset())
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("listing calendars"))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM calendars WHERE {FILTER}"))
            .bind(workspace_id)
            .bind(public_only)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting calendars"))?;

        into_page(rows, pagination, total)
    }

    async fn create(&self, calendar: &Calendar) -> Result<Calendar, DomainError> {
        let row: CalendarRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO calendars (id, workspace_id, name, description, is_public, created_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(calendar.id)
        .bind(calendar.workspace_id)
        .bind(&calendar.name)
        .bind(&calendar.description)
        .bind(calendar.is_public)
        .bind(calendar.created_at)
        .bind(calendar.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("creating calendar"))?;

        row.try_into()
    }

    async fn update(&self, calendar: &Calendar) -> Result<Calendar, DomainError> {
        let row: CalendarRow = sqlx::query_as(&format!(
            r#"
            UPDATE calendars
            SET name = $2, description = $3, is_public = $4, modified_at = $5
            WHERE id = $1 AND removed_at IS NULL
            RETURNING {COLUMNS}
            "#
        ))
        .bind(calendar.id)
        .bind(&calendar.name)
        .bind(&calendar.description)
        .bind(calendar.is_public)
        .bind(calendar.modified_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("updating calendar"))?
        .ok_or_else(|| DomainError::not_found("calendar", calendar.id))?;

        row.try_into()
    }

    async fn delete(&self, id: &Uuid) -> Result<(), DomainError> {
        sqlx::query("UPDATE calendars SET removed_at = NOW() WHERE id = $1 AND removed_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("deleting calendar"))?;

        Ok(())
    }
}
