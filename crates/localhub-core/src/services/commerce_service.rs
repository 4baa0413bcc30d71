//! Stores and their product catalogues

use std::sync::Arc;

use chrono::Utc;
use localhub_shared::types::{Page, Pagination};
use tracing::info;
use uuid::Uuid;

use crate::domain::{NewProduct, NewStore, Product, ProductUpdate, Store, StoreUpdate, WorkspaceRole};
use crate::error::DomainError;
use crate::repositories::{BusinessRepository, ProductRepository, StoreRepository};
use crate::services::access::WorkspaceAccess;
use crate::services::scope::in_workspace;
use crate::validation::{FieldErrors, Validated};

pub struct CommerceService {
    stores: Arc<dyn StoreRepository>,
    products: Arc<dyn ProductRepository>,
    businesses: Arc<dyn BusinessRepository>,
    access: WorkspaceAccess,
}

impl CommerceService {
    pub fn new(
        stores: Arc<dyn StoreRepository>,
        products: Arc<dyn ProductRepository>,
        businesses: Arc<dyn BusinessRepository>,
        access: WorkspaceAccess,
    ) -> Self {
        Self { stores, products, businesses, access }
    }

    // ---- stores ----

    pub async fn create_store(&self, workspace_id: Uuid, user_id: Uuid, input: NewStore) -> Result<Store, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        let mut errors = input.field_errors();
        self.check_business(workspace_id, input.business_id, &mut errors).await?;
        errors.into_result()?;

        let store = self.stores.create(&Store::create(workspace_id, input, user_id)).await?;
        info!(store_id = %store.id, slug = %store.slug, "Store created");
        Ok(store)
    }

    pub async fn get_store(&self, workspace_id: Uuid, id: Uuid, viewer: Option<Uuid>) -> Result<Store, DomainError> {
        let store = self.load_store(workspace_id, id).await?;
        self.ensure_visible(&store, viewer).await?;
        Ok(store)
    }

    pub async fn list_stores(&self, workspace_id: Uuid, viewer: Option<Uuid>, pagination: Pagination) -> Result<Page<Store>, DomainError> {
        let published_only = !self.access.can_moderate(workspace_id, viewer).await?;
        self.stores.list(&workspace_id, published_only, pagination).await
    }

    pub async fn update_store(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid, input: StoreUpdate) -> Result<Store, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        let mut errors = input.field_errors();
        self.check_business(workspace_id, input.business_id, &mut errors).await?;
        errors.into_result()?;

        let mut store = self.load_store(workspace_id, id).await?;
        store.apply(input);
        let store = self.stores.update(&store).await?;
        info!(store_id = %id, "Store updated");
        Ok(store)
    }

    pub async fn delete_store(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Admin).await?;
        self.load_store(workspace_id, id).await?;
        self.stores.delete(&id).await?;
        info!(store_id = %id, "Store deleted");
        Ok(())
    }

    pub async fn publish_store(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Store, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        let mut store = self.load_store(workspace_id, id).await?;
        store.publish(Utc::now())?;
        let store = self.stores.update(&store).await?;
        info!(store_id = %id, "Store published");
        Ok(store)
    }

    pub async fn unpublish_store(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Store, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        let mut store = self.load_store(workspace_id, id).await?;
        store.unpublish(Utc::now())?;
        let store = self.stores.update(&store).await?;
        info!(store_id = %id, "Store unpublished");
        Ok(store)
    }

    // ---- products ----

    pub async fn create_product(
        &self,
        workspace_id: Uuid,
        store_id: Uuid,
        user_id: Uuid,
        input: NewProduct,
    ) -> Result<Product, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        input.check()?;
        self.load_store(workspace_id, store_id).await?;

        let product = self.products.create(&Product::create(workspace_id, store_id, input)).await?;
        info!(product_id = %product.id, %store_id, "Product created");
        Ok(product)
    }

    pub async fn get_product(
        &self,
        workspace_id: Uuid,
        store_id: Uuid,
        id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<Product, DomainError> {
        let store = self.load_store(workspace_id, store_id).await?;
        let product = self.load_product(workspace_id, store_id, id).await?;
        if (store.is_public() && product.is_active) || self.access.can_moderate(workspace_id, viewer).await? {
            Ok(product)
        } else {
            Err(DomainError::not_found("product", id))
        }
    }

    /// Public readers see only active products of published stores.
    pub async fn list_products(
        &self,
        workspace_id: Uuid,
        store_id: Uuid,
        viewer: Option<Uuid>,
        pagination: Pagination,
    ) -> Result<Page<Product>, DomainError> {
        let store = self.load_store(workspace_id, store_id).await?;
        let moderator = self.access.can_moderate(workspace_id, viewer).await?;
        if !moderator && !store.is_public() {
            return Err(DomainError::not_found("store", store_id));
        }
        self.products.list_by_store(&store_id, !moderator, pagination).await
    }

    pub async fn update_product(
        &self,
        workspace_id: Uuid,
        store_id: Uuid,
        id: Uuid,
        user_id: Uuid,
        input: ProductUpdate,
    ) -> Result<Product, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        input.check()?;

        let mut product = self.load_product(workspace_id, store_id, id).await?;
        product.apply(input)?;
        let product = self.products.update(&product).await?;
        info!(product_id = %id, price_cents = product.price_cents, "Product updated");
        Ok(product)
    }

    pub async fn delete_product(&self, workspace_id: Uuid, store_id: Uuid, id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        self.load_product(workspace_id, store_id, id).await?;
        self.products.delete(&id).await?;
        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    async fn check_business(
        &self,
        workspace_id: Uuid,
        business_id: Option<Uuid>,
        errors: &mut FieldErrors,
    ) -> Result<(), DomainError> {
        if let Some(business_id) = business_id {
            let business = self.businesses.find_by_id(&business_id).await?;
            if in_workspace(business, workspace_id, business_id).is_err() {
                errors.add("business_id", "Business does not exist in this workspace");
            }
        }
        Ok(())
    }

    async fn ensure_visible(&self, store: &Store, viewer: Option<Uuid>) -> Result<(), DomainError> {
        if store.is_public() || self.access.can_moderate(store.workspace_id, viewer).await? {
            Ok(())
        } else {
            Err(DomainError::not_found("store", store.id))
        }
    }

    async fn load_store(&self, workspace_id: Uuid, id: Uuid) -> Result<Store, DomainError> {
        in_workspace(self.stores.find_by_id(&id).await?, workspace_id, id)
    }

    /// A product is only addressable through the store it belongs to.
    async fn load_product(&self, workspace_id: Uuid, store_id: Uuid, id: Uuid) -> Result<Product, DomainError> {
        let product = in_workspace(self.products.find_by_id(&id).await?, workspace_id, id)?;
        if product.store_id != store_id {
            return Err(DomainError::not_found("product", id));
        }
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MockBusinessRepository, MockProductRepository, MockStoreRepository};
    use crate::services::testing::access;

    fn store(workspace_id: Uuid, published: bool) -> Store {
        let mut store = Store::create(
            workspace_id,
            NewStore {
                name: "Corner Bakery".into(),
                slug: None,
                description: None,
                currency: "USD".into(),
                business_id: None,
            },
            Uuid::new_v4(),
        );
        if published {
            store.publish(Utc::now()).unwrap();
        }
        store
    }

    fn product(store: &Store) -> Product {
        Product::create(
            store.workspace_id,
            store.id,
            NewProduct {
                name: "Sourdough loaf".into(),
                slug: None,
                description: None,
                price_cents: 650,
                compare_at_price_cents: None,
                sku: Some("SD-001".into()),
                inventory_quantity: 12,
                is_active: true,
            },
        )
    }

    fn service(stores: MockStoreRepository, products: MockProductRepository, role: Option<WorkspaceRole>) -> CommerceService {
        CommerceService::new(Arc::new(stores), Arc::new(products), Arc::new(MockBusinessRepository::new()), access(role))
    }

    #[tokio::test]
    async fn test_unpublished_store_products_hidden_from_public() {
        let ws = Uuid::new_v4();
        let draft = store(ws, false);
        let store_id = draft.id;
        let mut stores = MockStoreRepository::new();
        stores.expect_find_by_id().returning(move |_| Ok(Some(draft.clone())));
        let mut products = MockProductRepository::new();
        products.expect_list_by_store().never();

        let result = service(stores, products, None).list_products(ws, store_id, None, Pagination::default()).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_public_product_listing_is_active_only() {
        let ws = Uuid::new_v4();
        let open = store(ws, true);
        let store_id = open.id;
        let mut stores = MockStoreRepository::new();
        stores.expect_find_by_id().returning(move |_| Ok(Some(open.clone())));
        let mut products = MockProductRepository::new();
        products
            .expect_list_by_store()
            .withf(|_, active_only, _| *active_only)
            .returning(|_, _, p| Ok(Page::new(vec![], p, 0)));

        let page = service(stores, products, None)
            .list_products(ws, store_id, None, Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_product_from_other_store_not_found() {
        let ws = Uuid::new_v4();
        let open = store(ws, true);
        let other = store(ws, true);
        let item = product(&other);
        let item_id = item.id;
        let open_id = open.id;
        let mut stores = MockStoreRepository::new();
        stores.expect_find_by_id().returning(move |_| Ok(Some(open.clone())));
        let mut products = MockProductRepository::new();
        products.expect_find_by_id().returning(move |_| Ok(Some(item.clone())));

        let result = service(stores, products, None).get_product(ws, open_id, item_id, None).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_compare_at_price_must_exceed_price() {
        let ws = Uuid::new_v4();
        let mut products = MockProductRepository::new();
        products.expect_create().never();
        let new_product = NewProduct {
            name: "Sourdough loaf".into(),
            slug: None,
            description: None,
            price_cents: 650,
            compare_at_price_cents: Some(100),
            sku: None,
            inventory_quantity: 0,
            is_active: true,
        };

        let result = service(MockStoreRepository::new(), products, Some(WorkspaceRole::Editor))
            .create_product(ws, Uuid::new_v4(), Uuid::new_v4(), new_product)
            .await;
        match result {
            Err(DomainError::Validation(errors)) => assert!(errors.contains("compare_at_price_cents")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_publish_twice_is_rejected() {
        let ws = Uuid::new_v4();
        let open = store(ws, true);
        let id = open.id;
        let mut stores = MockStoreRepository::new();
        stores.expect_find_by_id().returning(move |_| Ok(Some(open.clone())));
        stores.expect_update().never();

        let result = service(stores, MockProductRepository::new(), Some(WorkspaceRole::Editor))
            .publish_store(ws, id, Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(DomainError::InvalidStateTransition { .. })));
    }
}
