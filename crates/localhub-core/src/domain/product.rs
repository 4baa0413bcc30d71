//! Store product entity

use chrono::{DateTime, Utc};
use localhub_shared::utils::{normalize_optional, slugify};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;
use crate::validation::{validate_slug, FieldErrors, Validated};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub store_id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub compare_at_price_cents: Option<i64>,
    pub sku: Option<String>,
    pub inventory_quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewProduct {
    #[validate(length(min = 2, max = 255, message = "Product name must be between 2 and 255 characters"))]
    pub name: String,

    #[validate(
        length(min = 2, max = 255, message = "Slug must be between 2 and 255 characters"),
        custom(function = "validate_slug")
    )]
    pub slug: Option<String>,

    #[validate(length(max = 10000, message = "Description may not exceed 10000 characters"))]
    pub description: Option<String>,

    #[validate(range(min = 0, message = "Price may not be negative"))]
    pub price_cents: i64,

    pub compare_at_price_cents: Option<i64>,

    #[validate(length(max = 64, message = "SKU may not exceed 64 characters"))]
    pub sku: Option<String>,

    #[serde(default)]
    #[validate(range(min = 0, message = "Inventory may not be negative"))]
    pub inventory_quantity: i32,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

fn compare_at_rule(price: i64, compare_at: Option<i64>, errors: &mut FieldErrors) {
    if let Some(compare_at) = compare_at {
        if compare_at <= price {
            errors.add("compare_at_price_cents", "The compare-at price must be higher than the price");
        }
    }
}

impl Validated for NewProduct {
    fn cross_field_rules(&self, errors: &mut FieldErrors) {
        compare_at_rule(self.price_cents, self.compare_at_price_cents, errors);
        if self.slug.is_none() && slugify(&self.name).len() < 2 {
            errors.add("slug", "A slug is required when the name has no usable characters");
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProductUpdate {
    #[validate(length(min = 2, max = 255, message = "Product name must be between 2 and 255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 10000, message = "Description may not exceed 10000 characters"))]
    pub description: Option<String>,

    #[validate(range(min = 0, message = "Price may not be negative"))]
    pub price_cents: Option<i64>,

    pub compare_at_price_cents: Option<i64>,

    #[validate(length(max = 64, message = "SKU may not exceed 64 characters"))]
    pub sku: Option<String>,

    #[validate(range(min = 0, message = "Inventory may not be negative"))]
    pub inventory_quantity: Option<i32>,

    pub is_active: Option<bool>,
}

impl Validated for ProductUpdate {
    fn cross_field_rules(&self, errors: &mut FieldErrors) {
        if let Some(price) = self.price_cents {
            compare_at_rule(price, self.compare_at_price_cents, errors);
        }
    }
}

impl Product {
    pub fn create(workspace_id: Uuid, store_id: Uuid, input: NewProduct) -> Self {
        let slug = input.slug.unwrap_or_else(|| slugify(&input.name));
        Self {
            id: Uuid::new_v4(),
            store_id,
            workspace_id,
            name: input.name.trim().to_string(),
            slug,
            description: normalize_optional(input.description),
            price_cents: input.price_cents,
            compare_at_price_cents: input.compare_at_price_cents,
            sku: normalize_optional(input.sku),
            inventory_quantity: input.inventory_quantity,
            is_active: input.is_active,
            created_at: Utc::now(),
            modified_at: None,
            removed_at: None,
        }
    }

    /// Applies an update; the compare-at price is re-checked against the merged price.
    pub fn apply(&mut self, update: ProductUpdate) -> Result<(), DomainError> {
        let price = update.price_cents.unwrap_or(self.price_cents);
        let compare_at = update.compare_at_price_cents.or(self.compare_at_price_cents);
        let mut errors = FieldErrors::default();
        compare_at_rule(price, compare_at, &mut errors);
        errors.into_result()?;

        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if update.description.is_some() {
            self.description = normalize_optional(update.description);
        }
        if update.sku.is_some() {
            self.sku = normalize_optional(update.sku);
        }
        if let Some(quantity) = update.inventory_quantity {
            self.inventory_quantity = quantity;
        }
        if let Some(active) = update.is_active {
            self.is_active = active;
        }
        self.price_cents = price;
        self.compare_at_price_cents = compare_at;
        self.modified_at = Some(Utc::now());
        Ok(())
    }

    pub fn in_stock(&self) -> bool {
        self.inventory_quantity > 0
    }

    /// Discount off the compare-at price, in whole percent.
    pub fn discount_percent(&self) -> Option<i64> {
        self.compare_at_price_cents
            .filter(|compare| *compare > 0)
            .map(|compare| (compare - self.price_cents) * 100 / compare)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewProduct {
        NewProduct {
            name: "Sourdough Loaf".into(),
            slug: None,
            description: None,
            price_cents: 800,
            compare_at_price_cents: Some(1000),
            sku: Some("SD-001".into()),
            inventory_quantity: 12,
            is_active: true,
        }
    }

    #[test]
    fn test_create_product() {
        let product = Product::create(Uuid::new_v4(), Uuid::new_v4(), input());
        assert_eq!(product.slug, "sourdough-loaf");
        assert_eq!(product.discount_percent(), Some(20));
        assert!(product.in_stock());
    }

    #[test]
    fn test_compare_at_must_exceed_price() {
        let mut bad = input();
        bad.compare_at_price_cents = Some(800);
        assert!(bad.field_errors().contains("compare_at_price_cents"));

        let mut product = Product::create(Uuid::new_v4(), Uuid::new_v4(), input());
        let result = product.apply(ProductUpdate { price_cents: Some(1200), ..Default::default() });
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(product.price_cents, 800);
    }
}
