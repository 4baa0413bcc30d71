// ============================================================================
// LocalHub Infrastructure - PostgreSQL Store & Product Repositories
// File: crates/localhub-infrastructure/src/database/postgres/commerce_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use localhub_shared::types::{Page, Pagination};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use localhub_core::domain::{Product, Store};
use localhub_core::error::DomainError;
use localhub_core::repositories::{ProductRepository, StoreRepository};

use super::support::{db_error, into_page};

const STORE_COLUMNS: &str = "id, workspace_id, business_id, name, slug, description, currency, is_published, \
    published_at, created_at, created_by, modified_at, removed_at";

const PRODUCT_COLUMNS: &str = "id, store_id, workspace_id, name, slug, description, price_cents, \
    compare_at_price_cents, sku, inventory_quantity, is_active, created_at, modified_at, removed_at";

// ============================================================================
// Stores
// ============================================================================

pub struct PgStoreRepository {
    pool: PgPool,
}

impl PgStoreRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct StoreRow {
    id: Uuid,
    workspace_id: Uuid,
    business_id: Option<Uuid>,
    name: String,
    slug: String,
    description: Option<String>,
    currency: String,
    is_published: bool,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    modified_at: Option<DateTime<Utc>>,
    removed_at: Option<DateTime<Utc>>,
}

impl TryFrom<StoreRow> for Store {
    type Error = DomainError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        Ok(Store {
            id: row.id,
            workspace_id: row.workspace_id,
            business_id: row.business_id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            currency: row.currency,
            is_published: row.is_published,
            published_at: row.published_at,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        })
    }
}

#[async_trait]
impl StoreRepository for PgStoreRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Store>, DomainError> {
        let row: Option<StoreRow> =
            sqlx::query_as(&format!("SELECT {STORE_COLUMNS} FROM stores WHERE id = $1 AND removed_at IS NULL"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("finding store by id"))?;

        row.map(Store::try_from).transpose()
    }

    async fn list(&self, workspace_id: &Uuid, published_only: bool, pagination: Pagination) -> Result<Page<Store>, DomainError> {
        const FILTER: &str = "workspace_id = $1 AND removed_at IS NULL AND (NOT $2 OR is_published)";

        let rows: Vec<StoreRow> = sqlx::query_as(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE {FILTER} ORDER BY name LIMIT $3 OFFSET $4"
        ))
        .bind(workspace_id)
        .bind(published_only)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing stores"))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM stores WHERE {FILTER}"))
            .bind(workspace_id)
            .bind(published_only)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting stores"))?;

        into_page(rows, pagination, total)
    }

    async fn create(&self, store: &Store) -> Result<Store, DomainError> {
        let row: StoreRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO stores (
                id, workspace_id, business_id, name, slug, description, currency, is_published,
                published_at, created_at, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {STORE_COLUMNS}
            "#
        ))
        .bind(store.id)
        .bind(store.workspace_id)
        .bind(store.business_id)
        .bind(&store.name)
        .bind(&store.slug)
        .bind(&store.description)
        .bind(&store.currency)
        .bind(store.is_published)
        .bind(store.published_at)
        .bind(store.created_at)
        .bind(store.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("creating store"))?;

        row.try_into()
    }

    async fn update(&self, store: &Store) -> Result<Store, DomainError> {
        let row: StoreRow = sqlx::query_as(&format!(
            r#"
            UPDATE stores
            SET business_id = $2, name = $3, slug = $4, description = $5, currency = $6,
                is_published = $7, published_at = $8, modified_at = $9
            WHERE id = $1 AND removed_at IS NULL
            RETURNING {STORE_COLUMNS}
            "#
        ))
        .bind(store.id)
        .bind(store.business_id)
        .bind(&store.name)
        .bind(&store.slug)
        .bind(&store.description)
        .bind(&store.currency)
        .bind(store.is_published)
        .bind(store.published_at)
        .bind(store.modified_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("updating store"))?
        .ok_or_else(|| DomainError::not_found("store", store.id))?;

        row.try_into()
    }

    async fn delete(&self, id: &Uuid) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting store delete"))?;

        // Products go with their store.
        sqlx::query("UPDATE products SET removed_at = NOW() WHERE store_id = $1 AND removed_at IS NULL")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("deleting store products"))?;

        sqlx::query("UPDATE stores SET removed_at = NOW() WHERE id = $1 AND removed_at IS NULL")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("deleting store"))?;

        tx.commit().await.map_err(db_error("committing store delete"))?;
        Ok(())
    }
}

// ============================================================================
// Products
// ============================================================================

pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    store_id: Uuid,
    workspace_id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    price_cents: i64,
    compare_at_price_cents: Option<i64>,
    sku: Option<String>,
    inventory_quantity: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    modified_at: Option<DateTime<Utc>>,
    removed_at: Option<DateTime<Utc>>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DomainError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: row.id,
            store_id: row.store_id,
            workspace_id: row.workspace_id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            price_cents: row.price_cents,
            compare_at_price_cents: row.compare_at_price_cents,
            sku: row.sku,
            inventory_quantity: row.inventory_quantity,
            is_active: row.is_active,
            created_at: row.created_at,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        })
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Product>, DomainError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND removed_at IS NULL"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("finding product by id"))?;

        row.map(Product::try_from).transpose()
    }

    async fn list_by_store(&self, store_id: &Uuid, active_only: bool, pagination: Pagination) -> Result<Page<Product>, DomainError> {
        const FILTER: &str = "store_id = $1 AND removed_at IS NULL AND (NOT $2 OR is_active)";

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE {FILTER} ORDER BY name LIMIT $3 OFFSET $4"
        ))
        .bind(store_id)
        .bind(active_only)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing products"))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products WHERE {FILTER}"))
            .bind(store_id)
            .bind(active_only)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting products"))?;

        into_page(rows, pagination, total)
    }

    async fn create(&self, product: &Product) -> Result<Product, DomainError> {
        let row: ProductRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO products (
                id, store_id, workspace_id, name, slug, description, price_cents, compare_at_price_cents,
                sku, inventory_quantity, is_active, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.id)
        .bind(product.store_id)
        .bind(product.workspace_id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.compare_at_price_cents)
        .bind(&product.sku)
        .bind(product.inventory_quantity)
        .bind(product.is_active)
        .bind(product.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("creating product"))?;

        row.try_into()
    }

    async fn update(&self, product: &Product) -> Result<Product, DomainError> {
        let row: ProductRow = sqlx::query_as(&format!(
            r#"
            UPDATE products
            SET name = $2, slug = $3, description = $4, price_cents = $5, compare_at_price_cents = $6,
                sku = $7, inventory_quantity = $8, is_active = $9, modified_at = $10
            WHERE id = $1 AND removed_at IS NULL
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.compare_at_price_cents)
        .bind(&product.sku)
        .bind(product.inventory_quantity)
        .bind(product.is_active)
        .bind(product.modified_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("updating product"))?
        .ok_or_else(|| DomainError::not_found("product", product.id))?;

        row.try_into()
    }

    async fn delete(&self, id: &Uuid) -> Result<(), DomainError> {
        sqlx::query("UPDATE products SET removed_at = NOW() WHERE id = $1 AND removed_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("deleting product"))?;

        Ok(())
    }
}
