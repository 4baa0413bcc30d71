//! Ticket plans (inventory) and ticket orders

use chrono::{DateTime, Utc};
use localhub_shared::utils::normalize_optional;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;
use crate::validation::{FieldErrors, Validated};

string_enum! {
    TicketOrderStatus {
        Confirmed => "confirmed",
        Cancelled => "cancelled",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketPlan {
    pub id: Uuid,
    pub event_id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub quantity: i32,
    pub sold: i32,
    pub max_per_order: i32,
    pub sales_start: Option<DateTime<Utc>>,
    pub sales_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketOrder {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub total_cents: i64,
    pub status: TicketOrderStatus,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTicketPlan {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description may not exceed 1000 characters"))]
    pub description: Option<String>,

    #[validate(range(min = 0, message = "Price may not be negative"))]
    pub price_cents: i64,

    #[validate(range(min = 1, max = 100000, message = "Quantity must be between 1 and 100000"))]
    pub quantity: i32,

    #[serde(default = "default_max_per_order")]
    #[validate(range(min = 1, max = 20, message = "Max per order must be between 1 and 20"))]
    pub max_per_order: i32,

    pub sales_start: Option<DateTime<Utc>>,
    pub sales_end: Option<DateTime<Utc>>,
}

fn default_max_per_order() -> i32 {
    10
}

impl Validated for NewTicketPlan {
    fn cross_field_rules(&self, errors: &mut FieldErrors) {
        sales_window_rule(self.sales_start, self.sales_end, errors);
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TicketPlanUpdate {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 1000, message = "Description may not exceed 1000 characters"))]
    pub description: Option<String>,

    #[validate(range(min = 0, message = "Price may not be negative"))]
    pub price_cents: Option<i64>,

    #[validate(range(min = 1, max = 100000, message = "Quantity must be between 1 and 100000"))]
    pub quantity: Option<i32>,

    #[validate(range(min = 1, max = 20, message = "Max per order must be between 1 and 20"))]
    pub max_per_order: Option<i32>,

    pub sales_start: Option<DateTime<Utc>>,
    pub sales_end: Option<DateTime<Utc>>,
}

impl Validated for TicketPlanUpdate {
    fn cross_field_rules(&self, errors: &mut FieldErrors) {
        sales_window_rule(self.sales_start, self.sales_end, errors);
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PurchaseTickets {
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

impl Validated for PurchaseTickets {}

fn sales_window_rule(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>, errors: &mut FieldErrors) {
    if let (Some(start), Some(end)) = (start, end) {
        if end <= start {
            errors.add("sales_end", "Sales must end after they start");
        }
    }
}

impl TicketPlan {
    pub fn create(workspace_id: Uuid, event_id: Uuid, input: NewTicketPlan) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            workspace_id,
            name: input.name.trim().to_string(),
            description: normalize_optional(input.description),
            price_cents: input.price_cents,
            quantity: input.quantity,
            sold: 0,
            max_per_order: input.max_per_order,
            sales_start: input.sales_start,
            sales_end: input.sales_end,
            created_at: Utc::now(),
            modified_at: None,
        }
    }

    pub fn apply(&mut self, update: TicketPlanUpdate) -> Result<(), DomainError> {
        if let Some(quantity) = update.quantity {
            if quantity < self.sold {
                return Err(DomainError::field(
                    "quantity",
                    format!("Quantity cannot be lower than the {} tickets already sold", self.sold),
                ));
            }
        }
        let start = update.sales_start.or(self.sales_start);
        let end = update.sales_end.or(self.sales_end);
        if let (Some(start), Some(end)) = (start, end) {
            if end <= start {
                return Err(DomainError::field("sales_end", "Sales must end after they start"));
            }
        }
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if update.description.is_some() {
            self.description = normalize_optional(update.description);
        }
        if let Some(price) = update.price_cents {
            self.price_cents = price;
        }
        if let Some(quantity) = update.quantity {
            self.quantity = quantity;
        }
        if let Some(max) = update.max_per_order {
            self.max_per_order = max;
        }
        self.sales_start = start;
        self.sales_end = end;
        self.modified_at = Some(Utc::now());
        Ok(())
    }

    pub fn remaining(&self) -> i32 {
        (self.quantity - self.sold).max(0)
    }

    pub fn is_on_sale(&self, now: DateTime<Utc>) -> bool {
        self.sales_start.map_or(true, |s| s <= now) && self.sales_end.map_or(true, |e| now < e)
    }

    /// Checks everything about a purchase that does not depend on
    /// concurrent buyers; the inventory itself is reserved atomically by the
    /// repository.
    pub fn check_purchase(&self, quantity: i32, now: DateTime<Utc>) -> Result<(), DomainError> {
        if quantity < 1 || quantity > self.max_per_order {
            return Err(DomainError::field(
                "quantity",
                format!("Quantity must be between 1 and {}", self.max_per_order),
            ));
        }
        if !self.is_on_sale(now) {
            return Err(DomainError::transition("ticket plan", "off-sale", "purchase from"));
        }
        if quantity > self.remaining() {
            return Err(DomainError::SoldOut);
        }
        Ok(())
    }
}

impl TicketOrder {
    pub fn new(plan: &TicketPlan, user_id: Uuid, quantity: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            plan_id: plan.id,
            event_id: plan.event_id,
            user_id,
            quantity,
            unit_price_cents: plan.price_cents,
            total_cents: plan.price_cents * quantity as i64,
            status: TicketOrderStatus::Confirmed,
            created_at: Utc::now(),
            cancelled_at: None,
        }
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        match self.status {
            TicketOrderStatus::Confirmed => {
                self.status = TicketOrderStatus::Cancelled;
                self.cancelled_at = Some(now);
                Ok(())
            }
            other => Err(DomainError::transition("ticket order", other, "cancel")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn plan(quantity: i32) -> TicketPlan {
        TicketPlan::create(
            Uuid::new_v4(),
            Uuid::new_v4(),
            NewTicketPlan {
                name: "General Admission".into(),
                description: None,
                price_cents: 1500,
                quantity,
                max_per_order: 4,
                sales_start: None,
                sales_end: None,
            },
        )
    }

    #[test]
    fn test_order_totals() {
        let plan = plan(100);
        let order = TicketOrder::new(&plan, Uuid::new_v4(), 3);
        assert_eq!(order.total_cents, 4500);
        assert_eq!(order.status, TicketOrderStatus::Confirmed);
    }

    #[test]
    fn test_purchase_checks() {
        let mut plan = plan(5);
        let now = Utc::now();
        assert!(plan.check_purchase(2, now).is_ok());
        assert!(plan.check_purchase(0, now).is_err());
        assert!(plan.check_purchase(5, now).is_err());

        plan.sold = 4;
        assert!(matches!(plan.check_purchase(2, now), Err(DomainError::SoldOut)));
        assert!(plan.check_purchase(1, now).is_ok());
    }

    #[test]
    fn test_sales_window() {
        let mut plan = plan(10);
        let now = Utc::now();
        plan.sales_start = Some(now + Duration::hours(1));
        assert!(!plan.is_on_sale(now));
        assert!(plan.is_on_sale(now + Duration::hours(2)));

        plan.sales_end = Some(now + Duration::hours(3));
        assert!(!plan.is_on_sale(now + Duration::hours(3)));
    }

    #[test]
    fn test_window_rule() {
        let now = Utc::now();
        let input = NewTicketPlan {
            name: "VIP".into(),
            description: None,
            price_cents: -1,
            quantity: 0,
            max_per_order: 21,
            sales_start: Some(now),
            sales_end: Some(now),
        };
        let errors = input.field_errors();
        for field in ["price_cents", "quantity", "max_per_order", "sales_end"] {
            assert!(errors.contains(field), "expected error on {field}");
        }
    }

    #[test]
    fn test_quantity_not_below_sold() {
        let mut plan = plan(10);
        plan.sold = 6;
        assert!(plan.apply(TicketPlanUpdate { quantity: Some(5), ..Default::default() }).is_err());
        assert!(plan.apply(TicketPlanUpdate { quantity: Some(6), ..Default::default() }).is_ok());
        assert_eq!(plan.remaining(), 0);
    }

    #[test]
    fn test_cancel_once() {
        let plan = plan(10);
        let mut order = TicketOrder::new(&plan, Uuid::new_v4(), 1);
        order.cancel(Utc::now()).unwrap();
        assert!(order.cancel(Utc::now()).is_err());
    }
}
