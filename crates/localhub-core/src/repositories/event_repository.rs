//! Event repository trait (port)

use async_trait::async_trait;
use localhub_shared::types::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{Event, EventFilter, EventRsvp, RsvpStatus};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Event>, DomainError>;
    async fn list(&self, workspace_id: &Uuid, filter: &EventFilter, pagination: Pagination) -> Result<Page<Event>, DomainError>;
    async fn create(&self, event: &Event) -> Result<Event, DomainError>;
    async fn update(&self, event: &Event) -> Result<Event, DomainError>;
    async fn delete(&self, id: &Uuid) -> Result<(), DomainError>;
    async fn find_rsvp(&self, event_id: &Uuid, user_id: &Uuid) -> Result<Option<EventRsvp>, DomainError>;
    /// Upserts the RSVP and adjusts the event counters atomically. The event
    /// row is locked so `going_count` cannot pass `capacity`.
    async fn record_rsvp(&self, event_id: &Uuid, user_id: &Uuid, status: RsvpStatus) -> Result<(Event, EventRsvp), DomainError>;
    async fn list_attendees(&self, event_id: &Uuid, status: Option<RsvpStatus>, pagination: Pagination) -> Result<Page<EventRsvp>, DomainError>;
}
