// ============================================================================
// LocalHub Infrastructure - PostgreSQL Event Repository
// File: crates/localhub-infrastructure/src/database/postgres/event_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use localhub_shared::types::{Page, Pagination};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use localhub_core::domain::{Event, EventFilter, EventRsvp, EventStatus, RsvpStatus};
use localhub_core::error::DomainError;
use localhub_core::repositories::EventRepository;

use super::support::{db_error, decode, into_page, like_pattern};

const COLUMNS: &str = "id, workspace_id, calendar_id, business_id, title, description, venue, starts_at, ends_at, \
    capacity, price_cents, region_ids, status, going_count, interested_count, \
    created_at, created_by, modified_at, removed_at";

const RSVP_COLUMNS: &str = "id, event_id, user_id, status, created_at, modified_at";

const FILTER: &str = r#"
    workspace_id = $1 AND removed_at IS NULL
    AND ($2::text IS NULL OR status = $2)
    AND ($3::uuid IS NULL OR $3 = ANY(region_ids))
    AND ($4::uuid IS NULL OR calendar_id = $4)
    AND ($5::uuid IS NULL OR business_id = $5)
    AND ($6::timestamptz IS NULL OR ends_at >= $6)
    AND ($7::timestamptz IS NULL OR starts_at <= $7)
    AND ($8::text IS NULL OR title ILIKE $8 OR description ILIKE $8 OR venue ILIKE $8)
"#;

pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    workspace_id: Uuid,
    calendar_id: Option<Uuid>,
    business_id: Option<Uuid>,
    title: String,
    description: Option<String>,
    venue: Option<String>,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    capacity: Option<i32>,
    price_cents: i64,
    region_ids: Vec<Uuid>,
    status: String,
    going_count: i32,
    interested_count: i32,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    modified_at: Option<DateTime<Utc>>,
    removed_at: Option<DateTime<Utc>>,
}

impl TryFrom<EventRow> for Event {
    type Error = DomainError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Event {
            id: row.id,
            workspace_id: row.workspace_id,
            calendar_id: row.calendar_id,
            business_id: row.business_id,
            title: row.title,
            description: row.description,
            venue: row.venue,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            capacity: row.capacity,
            price_cents: row.price_cents,
            region_ids: row.region_ids,
            status: decode("status", &row.status, EventStatus::from_str)?,
            going_count: row.going_count,
            interested_count: row.interested_count,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RsvpRow {
    id: Uuid,
    event_id: Uuid,
    user_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    modified_at: Option<DateTime<Utc>>,
}

impl TryFrom<RsvpRow> for EventRsvp {
    type Error = DomainError;

    fn try_from(row: RsvpRow) -> Result<Self, Self::Error> {
        Ok(EventRsvp {
            id: row.id,
            event_id: row.event_id,
            user_id: row.user_id,
            status: decode("status", &row.status, RsvpStatus::from_str)?,
            created_at: row.created_at,
            modified_at: row.modified_at,
        })
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Event>, DomainError> {
        let row: Option<EventRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM events WHERE id = $1 AND removed_at IS NULL"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("finding event by id"))?;

        row.map(Event::try_from).transpose()
    }

    async fn list(&self, workspace_id: &Uuid, filter: &EventFilter, pagination: Pagination) -> Result<Page<Event>, DomainError> {
        let status = filter.status.map(|s| s.as_str());
        let search = like_pattern(&filter.search);

        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM events WHERE {FILTER} ORDER BY starts_at, id LIMIT $9 OFFSET $10"
        ))
        .bind(workspace_id)
        .bind(status)
        .bind(filter.region_id)
        .bind(filter.calendar_id)
        .bind(filter.business_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(&search)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing events"))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM events WHERE {FILTER}"))
            .bind(workspace_id)
            .bind(status)
            .bind(filter.region_id)
            .bind(filter.calendar_id)
            .bind(filter.business_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(&search)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting events"))?;

        into_page(rows, pagination, total)
    }

    async fn create(&self, event: &Event) -> Result<Event, DomainError> {
        let row: EventRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO events (
                id, workspace_id, calendar_id, business_id, title, description, venue, starts_at, ends_at,
                capacity, price_cents, region_ids, status, created_at, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(event.id)
        .bind(event.workspace_id)
        .bind(event.calendar_id)
        .bind(event.business_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.venue)
        .bind(event.starts_at)
        .bind(event.ends_at)
        .bind(event.capacity)
        .bind(event.price_cents)
        .bind(&event.region_ids)
        .bind(event.status.as_str())
        .bind(event.created_at)
        .bind(event.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("creating event"))?;

        row.try_into()
    }

    async fn update(&self, event: &Event) -> Result<Event, DomainError> {
        // Counters are owned by record_rsvp and never written here.
        let row: EventRow = sqlx::query_as(&format!(
            r#"
            UPDATE events
            SET calendar_id = $2, title = $3, description = $4, venue = $5, starts_at = $6, ends_at = $7,
                capacity = $8, price_cents = $9, region_ids = $10, status = $11, modified_at = $12
            WHERE id = $1 AND removed_at IS NULL
            RETURNING {COLUMNS}
            "#
        ))
        .bind(event.id)
        .bind(event.calendar_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.venue)
        .bind(event.starts_at)
        .bind(event.ends_at)
        .bind(event.capacity)
        .bind(event.price_cents)
        .bind(&event.region_ids)
        .bind(event.status.as_str())
        .bind(event.modified_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("updating event"))?
        .ok_or_else(|| DomainError::not_found("event", event.id))?;

        row.try_into()
    }

    async fn delete(&self, id: &Uuid) -> Result<(), DomainError> {
        sqlx::query("UPDATE events SET removed_at = NOW() WHERE id = $1 AND removed_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("deleting event"))?;

        Ok(())
    }

    async fn find_rsvp(&self, event_id: &Uuid, user_id: &Uuid) -> Result<Option<EventRsvp>, DomainError> {
        let row: Option<RsvpRow> = sqlx::query_as(&format!(
            "SELECT {RSVP_COLUMNS} FROM event_rsvps WHERE event_id = $1 AND user_id = $2"
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding rsvp"))?;

        row.map(EventRsvp::try_from).transpose()
    }

    async fn record_rsvp(&self, event_id: &Uuid, user_id: &Uuid, status: RsvpStatus) -> Result<(Event, EventRsvp), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting rsvp transaction"))?;

        let row: EventRow = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM events WHERE id = $1 AND removed_at IS NULL FOR UPDATE"
        ))
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("locking event"))?
        .ok_or_else(|| DomainError::not_found("event", event_id))?;
        let mut event = Event::try_from(row)?;

        let previous: Option<String> =
            sqlx::query_scalar("SELECT status FROM event_rsvps WHERE event_id = $1 AND user_id = $2")
                .bind(event_id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("loading previous rsvp"))?;
        let previous = previous
            .map(|s| decode("status", &s, RsvpStatus::from_str))
            .transpose()?;

        event.apply_rsvp_change(previous, status)?;

        let row: EventRow = sqlx::query_as(&format!(
            "UPDATE events SET going_count = $2, interested_count = $3 WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(event_id)
        .bind(event.going_count)
        .bind(event.interested_count)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("updating attendance counts"))?;
        let event = Event::try_from(row)?;

        let fresh = EventRsvp::new(*event_id, *user_id, status);
        let rsvp: RsvpRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO event_rsvps (id, event_id, user_id, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (event_id, user_id)
            DO UPDATE SET status = EXCLUDED.status, modified_at = NOW()
            RETURNING {RSVP_COLUMNS}
            "#
        ))
        .bind(fresh.id)
        .bind(fresh.event_id)
        .bind(fresh.user_id)
        .bind(status.as_str())
        .bind(fresh.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("saving rsvp"))?;

        tx.commit().await.map_err(db_error("committing rsvp"))?;

        debug!(%event_id, %user_id, status = %status, going = event.going_count, "RSVP recorded");
        Ok((event, rsvp.try_into()?))
    }

    async fn list_attendees(&self, event_id: &Uuid, status: Option<RsvpStatus>, pagination: Pagination) -> Result<Page<EventRsvp>, DomainError> {
        let status = status.map(|s| s.as_str());

        let rows: Vec<RsvpRow> = sqlx::query_as(&format!(
            r#"
            SELECT {RSVP_COLUMNS} FROM event_rsvps
            WHERE event_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(event_id)
        .bind(status)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing attendees"))?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM event_rsvps WHERE event_id = $1 AND ($2::text IS NULL OR status = $2)",
        )
        .bind(event_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("counting attendees"))?;

        into_page(rows, pagination, total)
    }
}
