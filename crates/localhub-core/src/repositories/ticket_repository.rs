//! Ticket plan and order repository trait (port)

use async_trait::async_trait;
use localhub_shared::types::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{TicketOrder, TicketPlan};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn find_plan(&self, id: &Uuid) -> Result<Option<TicketPlan>, DomainError>;
    async fn list_plans(&self, event_id: &Uuid) -> Result<Vec<TicketPlan>, DomainError>;
    async fn create_plan(&self, plan: &TicketPlan) -> Result<TicketPlan, DomainError>;
    async fn update_plan(&self, plan: &TicketPlan) -> Result<TicketPlan, DomainError>;
    /// Deletes only while nothing is sold; otherwise `Conflict`.
    async fn delete_plan(&self, id: &Uuid) -> Result<(), DomainError>;
    /// Reserves inventory with `sold + quantity <= quantity` and records the
    /// order in one transaction. Fails with `SoldOut` when the reservation misses.
    async fn purchase(&self, order: &TicketOrder) -> Result<TicketOrder, DomainError>;
    async fn find_order(&self, id: &Uuid) -> Result<Option<TicketOrder>, DomainError>;
    /// Marks a confirmed order cancelled and releases its seats. Releasing
    /// happens only when the status actually flipped.
    async fn cancel_order(&self, order: &TicketOrder) -> Result<TicketOrder, DomainError>;
    async fn list_orders_for_user(&self, user_id: &Uuid, pagination: Pagination) -> Result<Page<TicketOrder>, DomainError>;
}
