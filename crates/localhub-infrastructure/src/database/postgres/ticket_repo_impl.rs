// ============================================================================
// LocalHub Infrastructure - PostgreSQL Ticket Repository
// File: crates/localhub-infrastructure/src/database/postgres/ticket_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use localhub_shared::types::{Page, Pagination};
use sqlx::{FromRow, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use localhub_core::domain::{TicketOrder, TicketOrderStatus, TicketPlan};
use localhub_core::error::DomainError;
use localhub_core::repositories::TicketRepository;

use super::support::{db_error, decode, into_page, require_affected};

const PLAN_COLUMNS: &str = "id, event_id, workspace_id, name, description, price_cents, quantity, sold, \
    max_per_order, sales_start, sales_end, created_at, modified_at";

const ORDER_COLUMNS: &str =
    "id, plan_id, event_id, user_id, quantity, unit_price_cents, total_cents, status, created_at, cancelled_at";

pub struct PgTicketRepository {
    pool: PgPool,
}

impl PgTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PlanRow {
    id: Uuid,
    event_id: Uuid,
    workspace_id: Uuid,
    name: String,
    description: Option<String>,
    price_cents: i64,
    quantity: i32,
    sold: i32,
    max_per_order: i32,
    sales_start: Option<DateTime<Utc>>,
    sales_end: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    modified_at: Option<DateTime<Utc>>,
}

impl From<PlanRow> for TicketPlan {
    fn from(row: PlanRow) -> Self {
        TicketPlan {
            id: row.id,
            event_id: row.event_id,
            workspace_id: row.workspace_id,
            name: row.name,
            description: row.description,
            price_cents: row.price_cents,
            quantity: row.quantity,
            sold: row.sold,
            max_per_order: row.max_per_order,
            sales_start: row.sales_start,
            sales_end: row.sales_end,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    plan_id: Uuid,
    event_id: Uuid,
    user_id: Uuid,
    quantity: i32,
    unit_price_cents: i64,
    total_cents: i64,
    status: String,
    created_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for TicketOrder {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(TicketOrder {
            id: row.id,
            plan_id: row.plan_id,
            event_id: row.event_id,
            user_id: row.user_id,
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
            total_cents: row.total_cents,
            status: decode("status", &row.status, TicketOrderStatus::from_str)?,
            created_at: row.created_at,
            cancelled_at: row.cancelled_at,
        })
    }
}

#[async_trait]
impl TicketRepository for PgTicketRepository {
    async fn find_plan(&self, id: &Uuid) -> Result<Option<TicketPlan>, DomainError> {
        let row: Option<PlanRow> = sqlx::query_as(&format!("SELECT {PLAN_COLUMNS} FROM ticket_plans WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("finding ticket plan"))?;

        Ok(row.map(Into::into))
    }

    async fn list_plans(&self, event_id: &Uuid) -> Result<Vec<TicketPlan>, DomainError> {
        let rows: Vec<PlanRow> = sqlx::query_as(&format!(
            "SELECT {PLAN_COLUMNS} FROM ticket_plans WHERE event_id = $1 ORDER BY price_cents, name"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing ticket plans"))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_plan(&self, plan: &TicketPlan) -> Result<TicketPlan, DomainError> {
        let row: PlanRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO ticket_plans (
                id, event_id, workspace_id, name, description, price_cents, quantity, sold,
                max_per_order, sales_start, sales_end, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {PLAN_COLUMNS}
            "#
        ))
        .bind(plan.id)
        .bind(plan.event_id)
        .bind(plan.workspace_id)
        .bind(&plan.name)
        .bind(&plan.description)
        .bind(plan.price_cents)
        .bind(plan.quantity)
        .bind(plan.sold)
        .bind(plan.max_per_order)
        .bind(plan.sales_start)
        .bind(plan.sales_end)
        .bind(plan.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("creating ticket plan"))?;

        Ok(row.into())
    }

    async fn update_plan(&self, plan: &TicketPlan) -> Result<TicketPlan, DomainError> {
        // `sold` belongs to purchase/cancel; the check constraint keeps
        // `quantity` from dropping below it.
        let row: PlanRow = sqlx::query_as(&format!(
            r#"
            UPDATE ticket_plans
            SET name = $2, description = $3, price_cents = $4, quantity = $5, max_per_order = $6,
                sales_start = $7, sales_end = $8, modified_at = $9
            WHERE id = $1
            RETURNING {PLAN_COLUMNS}
            "#
        ))
        .bind(plan.id)
        .bind(&plan.name)
        .bind(&plan.description)
        .bind(plan.price_cents)
        .bind(plan.quantity)
        .bind(plan.max_per_order)
        .bind(plan.sales_start)
        .bind(plan.sales_end)
        .bind(plan.modified_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("updating ticket plan"))?
        .ok_or_else(|| DomainError::not_found("ticket plan", plan.id))?;

        Ok(row.into())
    }

    async fn delete_plan(&self, id: &Uuid) -> Result<(), DomainError> {
        let deleted = sqlx::query("DELETE FROM ticket_plans WHERE id = $1 AND sold = 0")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("deleting ticket plan"))?;

        require_affected(deleted.rows_affected(), "Tickets have already been sold for this plan")
    }

    async fn purchase(&self, order: &TicketOrder) -> Result<TicketOrder, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting purchase transaction"))?;

        let reserved = sqlx::query(
            "UPDATE ticket_plans SET sold = sold + $2 WHERE id = $1 AND sold + $2 <= quantity",
        )
        .bind(order.plan_id)
        .bind(order.quantity)
        .execute(&mut *tx)
        .await
        .map_err(db_error("reserving tickets"))?;

        if reserved.rows_affected() == 0 {
            warn!(plan_id = %order.plan_id, quantity = order.quantity, "Ticket reservation missed");
            return Err(DomainError::SoldOut);
        }

        let row: OrderRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO ticket_orders (
                id, plan_id, event_id, user_id, quantity, unit_price_cents, total_cents, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order.id)
        .bind(order.plan_id)
        .bind(order.event_id)
        .bind(order.user_id)
        .bind(order.quantity)
        .bind(order.unit_price_cents)
        .bind(order.total_cents)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("recording ticket order"))?;

        tx.commit().await.map_err(db_error("committing purchase"))?;

        info!(order_id = %order.id, plan_id = %order.plan_id, quantity = order.quantity, "Tickets purchased");
        row.try_into()
    }

    async fn find_order(&self, id: &Uuid) -> Result<Option<TicketOrder>, DomainError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM ticket_orders WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("finding ticket order"))?;

        row.map(TicketOrder::try_from).transpose()
    }

    async fn cancel_order(&self, order: &TicketOrder) -> Result<TicketOrder, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting cancel transaction"))?;

        let row: Option<OrderRow> = sqlx::query_as(&format!(
            r#"
            UPDATE ticket_orders
            SET status = $2, cancelled_at = $3
            WHERE id = $1 AND status = $4
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order.id)
        .bind(TicketOrderStatus::Cancelled.as_str())
        .bind(order.cancelled_at.unwrap_or_else(Utc::now))
        .bind(TicketOrderStatus::Confirmed.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("cancelling ticket order"))?;

        // Someone else cancelled first; the seats were already released.
        let Some(row) = row else {
            return Err(DomainError::transition("ticket order", TicketOrderStatus::Cancelled, "cancel"));
        };

        sqlx::query("UPDATE ticket_plans SET sold = sold - $2 WHERE id = $1")
            .bind(order.plan_id)
            .bind(order.quantity)
            .execute(&mut *tx)
            .await
            .map_err(db_error("releasing tickets"))?;

        tx.commit().await.map_err(db_error("committing cancellation"))?;

        row.try_into()
    }

    async fn list_orders_for_user(&self, user_id: &Uuid, pagination: Pagination) -> Result<Page<TicketOrder>, DomainError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM ticket_orders WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing ticket orders"))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ticket_orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting ticket orders"))?;

        into_page(rows, pagination, total)
    }
}
