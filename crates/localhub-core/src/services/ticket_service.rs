//! Ticket plans and orders

use std::sync::Arc;

use chrono::Utc;
use localhub_shared::types::{Page, Pagination};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    Event, EventStatus, NewTicketPlan, PurchaseTickets, TicketOrder, TicketPlan, TicketPlanUpdate, WorkspaceRole,
};
use crate::error::DomainError;
use crate::repositories::{EventRepository, TicketRepository};
use crate::services::access::WorkspaceAccess;
use crate::services::scope::in_workspace;
use crate::validation::Validated;

pub struct TicketService {
    tickets: Arc<dyn TicketRepository>,
    events: Arc<dyn EventRepository>,
    access: WorkspaceAccess,
}

impl TicketService {
    pub fn new(tickets: Arc<dyn TicketRepository>, events: Arc<dyn EventRepository>, access: WorkspaceAccess) -> Self {
        Self { tickets, events, access }
    }

    pub async fn create_plan(
        &self,
        workspace_id: Uuid,
        event_id: Uuid,
        user_id: Uuid,
        input: NewTicketPlan,
    ) -> Result<TicketPlan, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        input.check()?;
        self.load_event(workspace_id, event_id).await?;

        let plan = self.tickets.create_plan(&TicketPlan::create(workspace_id, event_id, input)).await?;
        info!(plan_id = %plan.id, %event_id, quantity = plan.quantity, "Ticket plan created");
        Ok(plan)
    }

    pub async fn list_plans(
        &self,
        workspace_id: Uuid,
        event_id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<Vec<TicketPlan>, DomainError> {
        let event = self.load_event(workspace_id, event_id).await?;
        if !event.is_public() && !self.access.can_moderate(workspace_id, viewer).await? {
            return Err(DomainError::not_found("event", event_id));
        }
        self.tickets.list_plans(&event_id).await
    }

    pub async fn update_plan(
        &self,
        workspace_id: Uuid,
        plan_id: Uuid,
        user_id: Uuid,
        input: TicketPlanUpdate,
    ) -> Result<TicketPlan, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        input.check()?;
        let mut plan = self.load_plan(workspace_id, plan_id).await?;
        plan.apply(input)?;
        self.tickets.update_plan(&plan).await
    }

    /// Plans with sold tickets cannot be removed.
    pub async fn delete_plan(&self, workspace_id: Uuid, plan_id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        let plan = self.load_plan(workspace_id, plan_id).await?;
        if plan.sold > 0 {
            return Err(DomainError::Conflict(format!("{} tickets have already been sold", plan.sold)));
        }
        self.tickets.delete_plan(&plan_id).await?;
        info!(%plan_id, "Ticket plan deleted");
        Ok(())
    }

    pub async fn purchase(
        &self,
        workspace_id: Uuid,
        plan_id: Uuid,
        user_id: Uuid,
        input: PurchaseTickets,
    ) -> Result<TicketOrder, DomainError> {
        input.check()?;
        let plan = self.load_plan(workspace_id, plan_id).await?;
        let event = self.load_event(workspace_id, plan.event_id).await?;
        if event.status != EventStatus::Published {
            return Err(DomainError::transition("event", event.status, "sell tickets for"));
        }
        plan.check_purchase(input.quantity, Utc::now())?;

        let order = TicketOrder::new(&plan, user_id, input.quantity);
        match self.tickets.purchase(&order).await {
            Ok(order) => {
                info!(order_id = %order.id, %plan_id, quantity = order.quantity, "Tickets purchased");
                Ok(order)
            }
            Err(e) => {
                warn!(%plan_id, %user_id, quantity = input.quantity, "Ticket purchase failed: {}", e);
                Err(e)
            }
        }
    }

    /// Only the buyer may cancel; seats are released once.
    pub async fn cancel_order(&self, order_id: Uuid, user_id: Uuid) -> Result<TicketOrder, DomainError> {
        let mut order = self
            .tickets
            .find_order(&order_id)
            .await?
            .filter(|o| o.user_id == user_id)
            .ok_or_else(|| DomainError::not_found("ticket order", order_id))?;
        order.cancel(Utc::now())?;

        let order = self.tickets.cancel_order(&order).await?;
        info!(%order_id, quantity = order.quantity, "Ticket order cancelled");
        Ok(order)
    }

    pub async fn list_orders_for_user(&self, user_id: Uuid, pagination: Pagination) -> Result<Page<TicketOrder>, DomainError> {
        self.tickets.list_orders_for_user(&user_id, pagination).await
    }

    async fn load_plan(&self, workspace_id: Uuid, plan_id: Uuid) -> Result<TicketPlan, DomainError> {
        in_workspace(self.tickets.find_plan(&plan_id).await?, workspace_id, plan_id)
    }

    async fn load_event(&self, workspace_id: Uuid, event_id: Uuid) -> Result<Event, DomainError> {
        in_workspace(self.events.find_by_id(&event_id).await?, workspace_id, event_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewEvent, TicketOrderStatus};
    use crate::repositories::{MockEventRepository, MockTicketRepository};
    use crate::services::testing::access;
    use chrono::Duration;

    fn published_event(workspace_id: Uuid) -> Event {
        let starts_at = Utc::now() + Duration::days(10);
        let mut event = Event::create(
            workspace_id,
            NewEvent {
                title: "Jazz in the Park".into(),
                description: None,
                venue: None,
                starts_at,
                ends_at: starts_at + Duration::hours(3),
                capacity: None,
                price_cents: 2000,
                calendar_id: None,
                business_id: None,
                region_ids: vec![],
            },
            Uuid::new_v4(),
        );
        event.publish().unwrap();
        event
    }

    fn plan(workspace_id: Uuid, event_id: Uuid, quantity: i32) -> TicketPlan {
        TicketPlan::create(
            workspace_id,
            event_id,
            NewTicketPlan {
                name: "Lawn".into(),
                description: None,
                price_cents: 2000,
                quantity,
                max_per_order: 4,
                sales_start: None,
                sales_end: None,
            },
        )
    }

    fn service(tickets: MockTicketRepository, event: Event) -> TicketService {
        let mut events = MockEventRepository::new();
        events.expect_find_by_id().returning(move |_| Ok(Some(event.clone())));
        TicketService::new(Arc::new(tickets), Arc::new(events), access(None))
    }

    #[tokio::test]
    async fn test_purchase_totals_and_limits() {
        let ws = Uuid::new_v4();
        let event = published_event(ws);
        let plan = plan(ws, event.id, 100);
        let plan_id = plan.id;
        let mut tickets = MockTicketRepository::new();
        tickets.expect_find_plan().returning(move |_| Ok(Some(plan.clone())));
        tickets.expect_purchase().times(1).returning(|o| Ok(o.clone()));

        let svc = service(tickets, event);
        let order = svc
            .purchase(ws, plan_id, Uuid::new_v4(), PurchaseTickets { quantity: 3 })
            .await
            .unwrap();
        assert_eq!(order.total_cents, 6000);
        assert_eq!(order.status, TicketOrderStatus::Confirmed);

        let too_many = svc.purchase(ws, plan_id, Uuid::new_v4(), PurchaseTickets { quantity: 5 }).await;
        assert!(matches!(too_many, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_sold_out_surfaces_from_repository() {
        let ws = Uuid::new_v4();
        let event = published_event(ws);
        let plan = plan(ws, event.id, 2);
        let plan_id = plan.id;
        let mut tickets = MockTicketRepository::new();
        tickets.expect_find_plan().returning(move |_| Ok(Some(plan.clone())));
        tickets.expect_purchase().returning(|_| Err(DomainError::SoldOut));

        let result = service(tickets, event)
            .purchase(ws, plan_id, Uuid::new_v4(), PurchaseTickets { quantity: 2 })
            .await;
        assert!(matches!(result, Err(DomainError::SoldOut)));
    }

    #[tokio::test]
    async fn test_cancel_only_by_buyer_and_once() {
        let ws = Uuid::new_v4();
        let event = published_event(ws);
        let plan = plan(ws, event.id, 10);
        let buyer = Uuid::new_v4();
        let mut order = TicketOrder::new(&plan, buyer, 2);
        let order_id = order.id;

        let confirmed = order.clone();
        let mut tickets = MockTicketRepository::new();
        tickets.expect_find_order().returning(move |_| Ok(Some(confirmed.clone())));
        tickets.expect_cancel_order().times(1).returning(|o| Ok(o.clone()));
        let svc = service(tickets, event.clone());

        assert!(matches!(svc.cancel_order(order_id, Uuid::new_v4()).await, Err(DomainError::NotFound { .. })));
        let cancelled = svc.cancel_order(order_id, buyer).await.unwrap();
        assert_eq!(cancelled.status, TicketOrderStatus::Cancelled);

        order.cancel(Utc::now()).unwrap();
        let mut tickets = MockTicketRepository::new();
        tickets.expect_find_order().returning(move |_| Ok(Some(order.clone())));
        tickets.expect_cancel_order().never();
        let svc = service(tickets, event);
        assert!(matches!(
            svc.cancel_order(order_id, buyer).await,
            Err(DomainError::InvalidStateTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_plans_with_sales_cannot_be_deleted() {
        let ws = Uuid::new_v4();
        let event = published_event(ws);
        let mut sold = plan(ws, event.id, 10);
        sold.sold = 3;
        let plan_id = sold.id;
        let mut tickets = MockTicketRepository::new();
        tickets.expect_find_plan().returning(move |_| Ok(Some(sold.clone())));
        tickets.expect_delete_plan().never();

        let svc = TicketService::new(
            Arc::new(tickets),
            Arc::new(MockEventRepository::new()),
            access(Some(WorkspaceRole::Editor)),
        );
        assert!(matches!(svc.delete_plan(ws, plan_id, Uuid::new_v4()).await, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_sale_racing_a_delete_is_reported() {
        let ws = Uuid::new_v4();
        let event = published_event(ws);
        let unsold = plan(ws, event.id, 10);
        let plan_id = unsold.id;
        let mut tickets = MockTicketRepository::new();
        tickets.expect_find_plan().returning(move |_| Ok(Some(unsold.clone())));
        tickets
            .expect_delete_plan()
            .times(1)
            .returning(|_| Err(DomainError::Conflict("Tickets have already been sold for this plan".into())));

        let svc = TicketService::new(
            Arc::new(tickets),
            Arc::new(MockEventRepository::new()),
            access(Some(WorkspaceRole::Editor)),
        );
        assert!(matches!(svc.delete_plan(ws, plan_id, Uuid::new_v4()).await, Err(DomainError::Conflict(_))));
    }
}
