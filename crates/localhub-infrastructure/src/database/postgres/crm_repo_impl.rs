// ============================================================================
// LocalHub Infrastructure - PostgreSQL CRM Repositories
// File: crates/localhub-infrastructure/src/database/postgres/crm_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use localhub_shared::types::{Page, Pagination};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use localhub_core::domain::{Customer, CustomerFilter, Deal, DealFilter, LifecycleStage, PipelineStage, StageSummary};
use localhub_core::error::DomainError;
use localhub_core::repositories::{CustomerRepository, DealRepository};

use super::support::{db_error, decode, into_page, like_pattern};

const CUSTOMER_COLUMNS: &str = "id, workspace_id, first_name, last_name, email, phone, company, lifecycle_stage, \
    notes, created_at, created_by, modified_at, removed_at";

const CUSTOMER_FILTER: &str = r#"
    workspace_id = $1 AND removed_at IS NULL
    AND ($2::text IS NULL OR lifecycle_stage = $2)
    AND ($3::text IS NULL OR first_name ILIKE $3 OR last_name ILIKE $3 OR email ILIKE $3 OR company ILIKE $3)
"#;

const DEAL_COLUMNS: &str = "id, workspace_id, customer_id, title, amount_cents, currency, stage, probability, \
    expected_close_date, notes, closed_at, created_at, created_by, modified_at, removed_at";

const DEAL_FILTER: &str = r#"
    workspace_id = $1 AND removed_at IS NULL
    AND ($2::text IS NULL OR stage = $2)
    AND ($3::uuid IS NULL OR customer_id = $3)
"#;

// ============================================================================
// Customers
// ============================================================================

pub struct PgCustomerRepository {
    pool: PgPool,
}

impl PgCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: Uuid,
    workspace_id: Uuid,
    first_name: String,
    last_name: Option<String>,
    email: String,
    phone: Option<String>,
    company: Option<String>,
    lifecycle_stage: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    modified_at: Option<DateTime<Utc>>,
    removed_at: Option<DateTime<Utc>>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = DomainError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        Ok(Customer {
            id: row.id,
            workspace_id: row.workspace_id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            company: row.company,
            lifecycle_stage: decode("lifecycle_stage", &row.lifecycle_stage, LifecycleStage::from_str)?,
            notes: row.notes,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        })
    }
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Customer>, DomainError> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1 AND removed_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding customer by id"))?;

        row.map(Customer::try_from).transpose()
    }

    async fn list(&self, workspace_id: &Uuid, filter: &CustomerFilter, pagination: Pagination) -> Result<Page<Customer>, DomainError> {
        let stage = filter.lifecycle_stage.map(|s| s.as_str());
        let search = like_pattern(&filter.search);

        let rows: Vec<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE {CUSTOMER_FILTER} \
             ORDER BY first_name, last_name NULLS FIRST, id LIMIT $4 OFFSET $5"
        ))
        .bind(workspace_id)
        .bind(stage)
        .bind(&search)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing customers"))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM customers WHERE {CUSTOMER_FILTER}"))
            .bind(workspace_id)
            .bind(stage)
            .bind(&search)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting customers"))?;

        into_page(rows, pagination, total)
    }

    async fn create(&self, customer: &Customer) -> Result<Customer, DomainError> {
        let row: CustomerRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO customers (
                id, workspace_id, first_name, last_name, email, phone, company, lifecycle_stage, notes,
                created_at, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(customer.id)
        .bind(customer.workspace_id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.company)
        .bind(customer.lifecycle_stage.as_str())
        .bind(&customer.notes)
        .bind(customer.created_at)
        .bind(customer.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("creating customer"))?;

        row.try_into()
    }

    async fn update(&self, customer: &Customer) -> Result<Customer, DomainError> {
        let row: CustomerRow = sqlx::query_as(&format!(
            r#"
            UPDATE customers
            SET first_name = $2, last_name = $3, email = $4, phone = $5, company = $6,
                lifecycle_stage = $7, notes = $8, modified_at = $9
            WHERE id = $1 AND removed_at IS NULL
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(customer.id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.company)
        .bind(customer.lifecycle_stage.as_str())
        .bind(&customer.notes)
        .bind(customer.modified_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("updating customer"))?
        .ok_or_else(|| DomainError::not_found("customer", customer.id))?;

        row.try_into()
    }

    async fn delete(&self, id: &Uuid) -> Result<(), DomainError> {
        sqlx::query("UPDATE customers SET removed_at = NOW() WHERE id = $1 AND removed_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("deleting customer"))?;

        Ok(())
    }
}

// ============================================================================
// Deals
// ============================================================================

pub struct PgDealRepository {
    pool: PgPool,
}

impl PgDealRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct DealRow {
    id: Uuid,
    workspace_id: Uuid,
    customer_id: Uuid,
    title: String,
    amount_cents: i64,
    currency: String,
    stage: String,
    probability: i32,
    expected_close_date: Option<NaiveDate>,
    notes: Option<String>,
    closed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    modified_at: Option<DateTime<Utc>>,
    removed_at: Option<DateTime<Utc>>,
}

impl TryFrom<DealRow> for Deal {
    type Error = DomainError;

    fn try_from(row: DealRow) -> Result<Self, Self::Error> {
        Ok(Deal {
            id: row.id,
            workspace_id: row.workspace_id,
            customer_id: row.customer_id,
            title: row.title,
            amount_cents: row.amount_cents,
            currency: row.currency,
            stage: decode("stage", &row.stage, PipelineStage::from_str)?,
            probability: row.probability,
            expected_close_date: row.expected_close_date,
            notes: row.notes,
            closed_at: row.closed_at,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct StageSummaryRow {
    stage: String,
    count: i64,
    total_amount_cents: i64,
}

impl TryFrom<StageSummaryRow> for StageSummary {
    type Error = DomainError;

    fn try_from(row: StageSummaryRow) -> Result<Self, Self::Error> {
        Ok(StageSummary {
            stage: decode("stage", &row.stage, PipelineStage::from_str)?,
            count: row.count,
            total_amount_cents: row.total_amount_cents,
        })
    }
}

async fn update_deal<'e, E>(executor: E, deal: &Deal) -> Result<Deal, DomainError>
where
    E: sqlx::PgExecutor<'e>,
{
    let row: DealRow = sqlx::query_as(&format!(
        r#"
        UPDATE deals
        SET title = $2, amount_cents = $3, currency = $4, stage = $5, probability = $6,
            expected_close_date = $7, notes = $8, closed_at = $9, modified_at = $10
        WHERE id = $1 AND removed_at IS NULL
        RETURNING {DEAL_COLUMNS}
        "#
    ))
    .bind(deal.id)
    .bind(&deal.title)
    .bind(deal.amount_cents)
    .bind(&deal.currency)
    .bind(deal.stage.as_str())
    .bind(deal.probability)
    .bind(deal.expected_close_date)
    .bind(&deal.notes)
    .bind(deal.closed_at)
    .bind(deal.modified_at)
    .fetch_optional(executor)
    .await
    .map_err(db_error("updating deal"))?
    .ok_or_else(|| DomainError::not_found("deal", deal.id))?;

    row.try_into()
}

#[async_trait]
impl DealRepository for PgDealRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Deal>, DomainError> {
        let row: Option<DealRow> =
            sqlx::query_as(&format!("SELECT {DEAL_COLUMNS} FROM deals WHERE id = $1 AND removed_at IS NULL"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("finding deal by id"))?;

        row.map(Deal::try_from).transpose()
    }

    async fn list(&self, workspace_id: &Uuid, filter: &DealFilter, pagination: Pagination) -> Result<Page<Deal>, DomainError> {
        let stage = filter.stage.map(|s| s.as_str());

        let rows: Vec<DealRow> = sqlx::query_as(&format!(
            "SELECT {DEAL_COLUMNS} FROM deals WHERE {DEAL_FILTER} \
             ORDER BY expected_close_date NULLS LAST, created_at DESC LIMIT $4 OFFSET $5"
        ))
        .bind(workspace_id)
        .bind(stage)
        .bind(filter.customer_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing deals"))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM deals WHERE {DEAL_FILTER}"))
            .bind(workspace_id)
            .bind(stage)
            .bind(filter.customer_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting deals"))?;

        into_page(rows, pagination, total)
    }

    async fn create(&self, deal: &Deal) -> Result<Deal, DomainError> {
        let row: DealRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO deals (
                id, workspace_id, customer_id, title, amount_cents, currency, stage, probability,
                expected_close_date, notes, closed_at, created_at, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {DEAL_COLUMNS}
            "#
        ))
        .bind(deal.id)
        .bind(deal.workspace_id)
        .bind(deal.customer_id)
        .bind(&deal.title)
        .bind(deal.amount_cents)
        .bind(&deal.currency)
        .bind(deal.stage.as_str())
        .bind(deal.probability)
        .bind(deal.expected_close_date)
        .bind(&deal.notes)
        .bind(deal.closed_at)
        .bind(deal.created_at)
        .bind(deal.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("creating deal"))?;

        row.try_into()
    }

    async fn update(&self, deal: &Deal) -> Result<Deal, DomainError> {
        update_deal(&self.pool, deal).await
    }

    async fn update_won(&self, deal: &Deal) -> Result<Deal, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting won deal transaction"))?;

        let updated = update_deal(&mut *tx, deal).await?;

        let promoted = sqlx::query(
            r#"
            UPDATE customers SET lifecycle_stage = $3, modified_at = NOW()
            WHERE id = $1 AND workspace_id = $2 AND removed_at IS NULL
            "#,
        )
        .bind(updated.customer_id)
        .bind(updated.workspace_id)
        .bind(LifecycleStage::Customer.as_str())
        .execute(&mut *tx)
        .await
        .map_err(db_error("promoting customer"))?;

        if promoted.rows_affected() == 0 {
            return Err(DomainError::not_found("customer", updated.customer_id));
        }

        tx.commit().await.map_err(db_error("committing won deal"))?;
        Ok(updated)
    }

    async fn delete(&self, id: &Uuid) -> Result<(), DomainError> {
        sqlx::query("UPDATE deals SET removed_at = NOW() WHERE id = $1 AND removed_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("deleting deal"))?;

        Ok(())
    }

    async fn pipeline_summary(&self, workspace_id: &Uuid) -> Result<Vec<StageSummary>, DomainError> {
        let rows: Vec<StageSummaryRow> = sqlx::query_as(
            r#"
            SELECT stage, COUNT(*) AS count, COALESCE(SUM(amount_cents), 0)::bigint AS total_amount_cents
            FROM deals
            WHERE workspace_id = $1 AND removed_at IS NULL
            GROUP BY stage
            "#,
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("summarising pipeline"))?;

        rows.into_iter().map(StageSummary::try_from).collect()
    }
}
