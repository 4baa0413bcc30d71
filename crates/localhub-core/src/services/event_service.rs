//! Events and RSVPs

use std::sync::Arc;

use chrono::Utc;
use localhub_shared::types::{Page, Pagination};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    Event, EventFilter, EventRsvp, EventStatus, EventUpdate, NewEvent, RsvpRequest, RsvpStatus, WorkspaceRole,
};
use crate::error::DomainError;
use crate::repositories::{BusinessRepository, CalendarRepository, EventRepository, RegionRepository};
use crate::services::access::WorkspaceAccess;
use crate::services::region_service::check_region_refs;
use crate::services::scope::in_workspace;
use crate::validation::{FieldErrors, Validated};

pub struct EventService {
    events: Arc<dyn EventRepository>,
    calendars: Arc<dyn CalendarRepository>,
    businesses: Arc<dyn BusinessRepository>,
    regions: Arc<dyn RegionRepository>,
    access: WorkspaceAccess,
}

impl EventService {
    pub fn new(
        events: Arc<dyn EventRepository>,
        calendars: Arc<dyn CalendarRepository>,
        businesses: Arc<dyn BusinessRepository>,
        regions: Arc<dyn RegionRepository>,
        access: WorkspaceAccess,
    ) -> Self {
        Self { events, calendars, businesses, regions, access }
    }

    pub async fn create(&self, workspace_id: Uuid, user_id: Uuid, input: NewEvent) -> Result<Event, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        let mut errors = input.field_errors();
        self.check_refs(workspace_id, input.calendar_id, input.business_id, &input.region_ids, &mut errors)
            .await?;
        errors.into_result()?;

        let event = self.events.create(&Event::create(workspace_id, input, user_id)).await?;
        info!(event_id = %event.id, %workspace_id, "Event created");
        Ok(event)
    }

    pub async fn get(&self, workspace_id: Uuid, id: Uuid, viewer: Option<Uuid>) -> Result<Event, DomainError> {
        let event = self.load(workspace_id, id).await?;
        if event.is_public() || self.access.can_moderate(workspace_id, viewer).await? {
            Ok(event)
        } else {
            Err(DomainError::not_found("event", id))
        }
    }

    pub async fn list(
        &self,
        workspace_id: Uuid,
        viewer: Option<Uuid>,
        mut filter: EventFilter,
        pagination: Pagination,
    ) -> Result<Page<Event>, DomainError> {
        if !self.access.can_moderate(workspace_id, viewer).await? {
            filter.status = Some(EventStatus::Published);
        }
        self.events.list(&workspace_id, &filter, pagination).await
    }

    pub async fn update(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid, input: EventUpdate) -> Result<Event, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        let mut errors = input.field_errors();
        let region_ids = input.region_ids.clone().unwrap_or_default();
        self.check_refs(workspace_id, input.calendar_id, None, &region_ids, &mut errors).await?;
        errors.into_result()?;

        let mut event = self.load(workspace_id, id).await?;
        event.apply(input)?;
        let event = self.events.update(&event).await?;
        info!(event_id = %id, "Event updated");
        Ok(event)
    }

    pub async fn delete(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        self.load(workspace_id, id).await?;
        self.events.delete(&id).await?;
        info!(event_id = %id, "Event deleted");
        Ok(())
    }

    pub async fn publish(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Event, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        let mut event = self.load(workspace_id, id).await?;
        event.publish()?;
        let event = self.events.update(&event).await?;
        info!(event_id = %id, "Event published");
        Ok(event)
    }

    pub async fn cancel(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Event, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        let mut event = self.load(workspace_id, id).await?;
        event.cancel()?;
        let event = self.events.update(&event).await?;
        info!(event_id = %id, "Event cancelled");
        Ok(event)
    }

    /// Records or changes the caller's RSVP. Capacity is enforced by the
    /// repository under a row lock; the check here gives early feedback.
    pub async fn rsvp(
        &self,
        workspace_id: Uuid,
        id: Uuid,
        user_id: Uuid,
        input: RsvpRequest,
    ) -> Result<(Event, EventRsvp), DomainError> {
        let event = self.load(workspace_id, id).await?;
        event.ensure_accepts_rsvp(Utc::now())?;

        let previous = self.events.find_rsvp(&id, &user_id).await?.map(|r| r.status);
        let mut preview = event.clone();
        if let Err(e) = preview.apply_rsvp_change(previous, input.status) {
            warn!(event_id = %id, %user_id, "RSVP refused: {}", e);
            return Err(e);
        }

        let (event, rsvp) = self.events.record_rsvp(&id, &user_id, input.status).await?;
        info!(event_id = %id, %user_id, status = %rsvp.status, going = event.going_count, "RSVP recorded");
        Ok((event, rsvp))
    }

    pub async fn list_attendees(
        &self,
        workspace_id: Uuid,
        id: Uuid,
        user_id: Uuid,
        status: Option<RsvpStatus>,
        pagination: Pagination,
    ) -> Result<Page<EventRsvp>, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Editor).await?;
        self.load(workspace_id, id).await?;
        self.events.list_attendees(&id, status, pagination).await
    }

    async fn check_refs(
        &self,
        workspace_id: Uuid,
        calendar_id: Option<Uuid>,
        business_id: Option<Uuid>,
        region_ids: &[Uuid],
        errors: &mut FieldErrors,
    ) -> Result<(), DomainError> {
        if let Some(calendar_id) = calendar_id {
            let found = self.calendars.find_by_id(&calendar_id).await?;
            if in_workspace(found, workspace_id, calendar_id).is_err() {
                errors.add("calendar_id", "Calendar does not exist in this workspace");
            }
        }
        if let Some(business_id) = business_id {
            let found = self.businesses.find_by_id(&business_id).await?;
            if in_workspace(found, workspace_id, business_id).is_err() {
                errors.add("business_id", "Business does not exist in this workspace");
            }
        }
        check_region_refs(self.regions.as_ref(), region_ids, errors).await
    }

    async fn load(&self, workspace_id: Uuid, id: Uuid) -> Result<Event, DomainError> {
        in_workspace(self.events.find_by_id(&id).await?, workspace_id, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{
        MockBusinessRepository, MockCalendarRepository, MockEventRepository, MockRegionRepository,
    };
    use crate::services::testing::access;
    use chrono::Duration;

    fn new_event(workspace_id: Uuid, capacity: Option<i32>) -> Event {
        let starts_at = Utc::now() + Duration::days(3);
        Event::create(
            workspace_id,
            NewEvent {
                title: "Community cleanup".into(),
                description: None,
                venue: None,
                starts_at,
                ends_at: starts_at + Duration::hours(2),
                capacity,
                price_cents: 0,
                calendar_id: None,
                business_id: None,
                region_ids: vec![],
            },
            Uuid::new_v4(),
        )
    }

    fn service(events: MockEventRepository, role: Option<WorkspaceRole>) -> EventService {
        EventService::new(
            Arc::new(events),
            Arc::new(MockCalendarRepository::new()),
            Arc::new(MockBusinessRepository::new()),
            Arc::new(MockRegionRepository::new()),
            access(role),
        )
    }

    #[tokio::test]
    async fn test_rsvp_to_draft_is_refused() {
        let ws = Uuid::new_v4();
        let event = new_event(ws, None);
        let id = event.id;
        let mut events = MockEventRepository::new();
        events.expect_find_by_id().returning(move |_| Ok(Some(event.clone())));
        events.expect_record_rsvp().never();

        let result = service(events, None)
            .rsvp(ws, id, Uuid::new_v4(), RsvpRequest { status: RsvpStatus::Going })
            .await;
        assert!(matches!(result, Err(DomainError::InvalidStateTransition { .. })));
    }

    #[tokio::test]
    async fn test_rsvp_to_full_event_is_refused() {
        let ws = Uuid::new_v4();
        let mut event = new_event(ws, Some(1));
        event.publish().unwrap();
        event.going_count = 1;
        let id = event.id;
        let mut events = MockEventRepository::new();
        events.expect_find_by_id().returning(move |_| Ok(Some(event.clone())));
        events.expect_find_rsvp().returning(|_, _| Ok(None));
        events.expect_record_rsvp().never();

        let result = service(events, None)
            .rsvp(ws, id, Uuid::new_v4(), RsvpRequest { status: RsvpStatus::Going })
            .await;
        assert!(matches!(result, Err(DomainError::EventFull)));
    }

    #[tokio::test]
    async fn test_rsvp_records_through_repository() {
        let ws = Uuid::new_v4();
        let mut event = new_event(ws, Some(10));
        event.publish().unwrap();
        let id = event.id;
        let stored = event.clone();
        let mut events = MockEventRepository::new();
        events.expect_find_by_id().returning(move |_| Ok(Some(event.clone())));
        events.expect_find_rsvp().returning(|_, _| Ok(None));
        events.expect_record_rsvp().times(1).returning(move |event_id, user_id, status| {
            let mut updated = stored.clone();
            updated.going_count += 1;
            Ok((updated, EventRsvp::new(*event_id, *user_id, status)))
        });

        let (event, rsvp) = service(events, None)
            .rsvp(ws, id, Uuid::new_v4(), RsvpRequest { status: RsvpStatus::Going })
            .await
            .unwrap();
        assert_eq!(event.going_count, 1);
        assert_eq!(rsvp.status, RsvpStatus::Going);
    }

    #[tokio::test]
    async fn test_create_checks_calendar_workspace() {
        let ws = Uuid::new_v4();
        let mut calendars = MockCalendarRepository::new();
        calendars.expect_find_by_id().returning(|_| Ok(None));
        let mut events = MockEventRepository::new();
        events.expect_create().never();

        let svc = EventService::new(
            Arc::new(events),
            Arc::new(calendars),
            Arc::new(MockBusinessRepository::new()),
            Arc::new(MockRegionRepository::new()),
            access(Some(WorkspaceRole::Editor)),
        );
        let starts_at = Utc::now() + Duration::days(1);
        let input = NewEvent {
            title: "Trivia night".into(),
            description: None,
            venue: None,
            starts_at,
            ends_at: starts_at - Duration::hours(1),
            capacity: None,
            price_cents: 0,
            calendar_id: Some(Uuid::new_v4()),
            business_id: None,
            region_ids: vec![],
        };
        match svc.create(ws, Uuid::new_v4(), input).await {
            Err(DomainError::Validation(errors)) => {
                assert!(errors.contains("calendar_id"));
                assert!(errors.contains("ends_at"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
