//! Event entity, RSVPs and attendance counting

use chrono::{DateTime, Utc};
use localhub_shared::utils::normalize_optional;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;
use crate::validation::{FieldErrors, Validated};

string_enum! {
    EventStatus {
        Draft => "draft",
        Published => "published",
        Cancelled => "cancelled",
    }
}

string_enum! {
    RsvpStatus {
        Going => "going",
        Interested => "interested",
        NotGoing => "not_going",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub calendar_id: Option<Uuid>,
    pub business_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub venue: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub capacity: Option<i32>,
    pub price_cents: i64,
    pub region_ids: Vec<Uuid>,
    pub status: EventStatus,
    pub going_count: i32,
    pub interested_count: i32,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRsvp {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: RsvpStatus,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl EventRsvp {
    pub fn new(event_id: Uuid, user_id: Uuid, status: RsvpStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            status,
            created_at: Utc::now(),
            modified_at: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewEvent {
    #[validate(length(min = 3, max = 255, message = "Title must be between 3 and 255 characters"))]
    pub title: String,

    #[validate(length(max = 10000, message = "Description may not exceed 10000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 255, message = "Venue may not exceed 255 characters"))]
    pub venue: Option<String>,

    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,

    #[validate(range(min = 1, max = 100000, message = "Capacity must be between 1 and 100000"))]
    pub capacity: Option<i32>,

    #[serde(default)]
    #[validate(range(min = 0, message = "Price may not be negative"))]
    pub price_cents: i64,

    pub calendar_id: Option<Uuid>,
    pub business_id: Option<Uuid>,

    #[serde(default)]
    #[validate(length(max = 20, message = "No more than 20 regions may be selected"))]
    pub region_ids: Vec<Uuid>,
}

impl Validated for NewEvent {
    fn cross_field_rules(&self, errors: &mut FieldErrors) {
        if self.ends_at <= self.starts_at {
            errors.add("ends_at", "The end time must be after the start time");
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct EventUpdate {
    #[validate(length(min = 3, max = 255, message = "Title must be between 3 and 255 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 10000, message = "Description may not exceed 10000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 255, message = "Venue may not exceed 255 characters"))]
    pub venue: Option<String>,

    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,

    #[validate(range(min = 1, max = 100000, message = "Capacity must be between 1 and 100000"))]
    pub capacity: Option<i32>,

    #[validate(range(min = 0, message = "Price may not be negative"))]
    pub price_cents: Option<i64>,

    pub calendar_id: Option<Uuid>,

    #[validate(length(max = 20, message = "No more than 20 regions may be selected"))]
    pub region_ids: Option<Vec<Uuid>>,
}

impl Validated for EventUpdate {
    fn cross_field_rules(&self, errors: &mut FieldErrors) {
        if let (Some(starts), Some(ends)) = (self.starts_at, self.ends_at) {
            if ends <= starts {
                errors.add("ends_at", "The end time must be after the start time");
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RsvpRequest {
    pub status: RsvpStatus,
}

impl Validated for RsvpRequest {}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub region_id: Option<Uuid>,
    pub calendar_id: Option<Uuid>,
    pub business_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub search: Option<String>,
}

impl Event {
    pub fn create(workspace_id: Uuid, input: NewEvent, created_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            calendar_id: input.calendar_id,
            business_id: input.business_id,
            title: input.title.trim().to_string(),
            description: normalize_optional(input.description),
            venue: normalize_optional(input.venue),
            starts_at: input.starts_at,
            ends_at: input.ends_at,
            capacity: input.capacity,
            price_cents: input.price_cents,
            region_ids: super::dedup_ids(input.region_ids),
            status: EventStatus::Draft,
            going_count: 0,
            interested_count: 0,
            created_at: Utc::now(),
            created_by: Some(created_by),
            modified_at: None,
            removed_at: None,
        }
    }

    /// Applies an update; the start/end pair is re-checked against the merged values.
    pub fn apply(&mut self, update: EventUpdate) -> Result<(), DomainError> {
        let starts_at = update.starts_at.unwrap_or(self.starts_at);
        let ends_at = update.ends_at.unwrap_or(self.ends_at);
        if ends_at <= starts_at {
            return Err(DomainError::field("ends_at", "The end time must be after the start time"));
        }
        if let Some(capacity) = update.capacity {
            if capacity < self.going_count {
                return Err(DomainError::field(
                    "capacity",
                    format!("Capacity cannot be lower than the {} people already going", self.going_count),
                ));
            }
            self.capacity = Some(capacity);
        }
        if let Some(title) = update.title {
            self.title = title.trim().to_string();
        }
        if update.description.is_some() {
            self.description = normalize_optional(update.description);
        }
        if update.venue.is_some() {
            self.venue = normalize_optional(update.venue);
        }
        if let Some(price) = update.price_cents {
            self.price_cents = price;
        }
        if update.calendar_id.is_some() {
            self.calendar_id = update.calendar_id;
        }
        if let Some(region_ids) = update.region_ids {
            self.region_ids = super::dedup_ids(region_ids);
        }
        self.starts_at = starts_at;
        self.ends_at = ends_at;
        self.modified_at = Some(Utc::now());
        Ok(())
    }

    pub fn publish(&mut self) -> Result<(), DomainError> {
        match self.status {
            EventStatus::Draft => {
                self.status = EventStatus::Published;
                self.modified_at = Some(Utc::now());
                Ok(())
            }
            other => Err(DomainError::transition("event", other, "publish")),
        }
    }

    pub fn cancel(&mut self) -> Result<(), DomainError> {
        match self.status {
            EventStatus::Draft | EventStatus::Published => {
                self.status = EventStatus::Cancelled;
                self.modified_at = Some(Utc::now());
                Ok(())
            }
            other => Err(DomainError::transition("event", other, "cancel")),
        }
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.ends_at <= now
    }

    pub fn is_public(&self) -> bool {
        self.status == EventStatus::Published && self.removed_at.is_none()
    }

    pub fn ensure_accepts_rsvp(&self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != EventStatus::Published {
            return Err(DomainError::transition("event", self.status, "rsvp to"));
        }
        if self.has_ended(now) {
            return Err(DomainError::transition("event", "ended", "rsvp to"));
        }
        Ok(())
    }

    /// Moves one attendee from `previous` to `next`, enforcing capacity on
    /// `going`. Counts are untouched when the change is rejected.
    pub fn apply_rsvp_change(
        &mut self,
        previous: Option<RsvpStatus>,
        next: RsvpStatus,
    ) -> Result<(), DomainError> {
        if previous == Some(next) {
            return Ok(());
        }
        if next == RsvpStatus::Going {
            if let Some(capacity) = self.capacity {
                if self.going_count >= capacity {
                    return Err(DomainError::EventFull);
                }
            }
        }
        match previous {
            Some(RsvpStatus::Going) => self.going_count -= 1,
            Some(RsvpStatus::Interested) => self.interested_count -= 1,
            _ => {}
        }
        match next {
            RsvpStatus::Going => self.going_count += 1,
            RsvpStatus::Interested => self.interested_count += 1,
            RsvpStatus::NotGoing => {}
        }
        Ok(())
    }

    pub fn spots_left(&self) -> Option<i32> {
        self.capacity.map(|c| (c - self.going_count).max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_event(capacity: Option<i32>) -> NewEvent {
        let starts_at = Utc::now() + Duration::days(7);
        NewEvent {
            title: "Summer Block Party".into(),
            description: None,
            venue: Some("Main Street".into()),
            starts_at,
            ends_at: starts_at + Duration::hours(4),
            capacity,
            price_cents: 0,
            calendar_id: None,
            business_id: None,
            region_ids: vec![],
        }
    }

    fn published(capacity: Option<i32>) -> Event {
        let mut event = Event::create(Uuid::new_v4(), new_event(capacity), Uuid::new_v4());
        event.publish().unwrap();
        event
    }

    #[test]
    fn test_end_must_follow_start() {
        let mut input = new_event(None);
        input.ends_at = input.starts_at;
        assert!(input.field_errors().contains("ends_at"));
        input.ends_at = input.starts_at - Duration::minutes(1);
        assert!(input.field_errors().contains("ends_at"));
    }

    #[test]
    fn test_update_rechecks_merged_dates() {
        let mut event = published(None);
        let too_early = event.starts_at - Duration::hours(1);
        let result = event.apply(EventUpdate { ends_at: Some(too_early), ..Default::default() });
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_capacity_enforced() {
        let mut event = published(Some(2));
        event.apply_rsvp_change(None, RsvpStatus::Going).unwrap();
        event.apply_rsvp_change(None, RsvpStatus::Going).unwrap();
        assert!(matches!(event.apply_rsvp_change(None, RsvpStatus::Going), Err(DomainError::EventFull)));
        assert_eq!(event.going_count, 2);
        assert_eq!(event.spots_left(), Some(0));

        // interested does not consume capacity
        event.apply_rsvp_change(None, RsvpStatus::Interested).unwrap();
        assert_eq!(event.interested_count, 1);
    }

    #[test]
    fn test_changing_rsvp_moves_counts() {
        let mut event = published(Some(1));
        event.apply_rsvp_change(None, RsvpStatus::Going).unwrap();
        event.apply_rsvp_change(Some(RsvpStatus::Going), RsvpStatus::Interested).unwrap();
        assert_eq!(event.going_count, 0);
        assert_eq!(event.interested_count, 1);

        event.apply_rsvp_change(Some(RsvpStatus::Interested), RsvpStatus::Going).unwrap();
        assert_eq!(event.going_count, 1);
        assert_eq!(event.interested_count, 0);

        // same status again is a no-op even when full
        event.apply_rsvp_change(Some(RsvpStatus::Going), RsvpStatus::Going).unwrap();
        assert_eq!(event.going_count, 1);
    }

    #[test]
    fn test_rsvp_requires_published_upcoming_event() {
        let draft = Event::create(Uuid::new_v4(), new_event(None), Uuid::new_v4());
        assert!(draft.ensure_accepts_rsvp(Utc::now()).is_err());

        let event = published(None);
        assert!(event.ensure_accepts_rsvp(Utc::now()).is_ok());
        assert!(event.ensure_accepts_rsvp(event.ends_at + Duration::minutes(1)).is_err());

        let mut cancelled = published(None);
        cancelled.cancel().unwrap();
        assert!(cancelled.ensure_accepts_rsvp(Utc::now()).is_err());
    }

    #[test]
    fn test_capacity_cannot_drop_below_going() {
        let mut event = published(Some(5));
        event.apply_rsvp_change(None, RsvpStatus::Going).unwrap();
        event.apply_rsvp_change(None, RsvpStatus::Going).unwrap();
        let result = event.apply(EventUpdate { capacity: Some(1), ..Default::default() });
        assert!(result.is_err());
        assert_eq!(event.capacity, Some(5));
    }
}
