//! Follow registry shared by businesses, calendars and organizations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

string_enum! {
    FollowableKind {
        Business => "business",
        Calendar => "calendar",
        Organization => "organization",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    pub user_id: Uuid,
    pub kind: FollowableKind,
    pub target_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Follow {
    pub fn new(user_id: Uuid, kind: FollowableKind, target_id: Uuid) -> Self {
        Self { user_id, kind, target_id, created_at: Utc::now() }
    }
}

/// Query for `GET /me/follows`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FollowQuery {
    pub kind: Option<FollowableKind>,
}
