//! Workspace scoping for loaded entities.

use uuid::Uuid;

use crate::domain::{
    Business, Calendar, Classified, Conversation, Coupon, Customer, Deal, Event, Organization, Post, Product,
    Rollout, Store, TicketPlan,
};
use crate::error::DomainError;

/// An entity that lives inside one workspace.
pub trait WorkspaceScoped {
    const ENTITY: &'static str;

    fn workspace_id(&self) -> Uuid;

    fn is_removed(&self) -> bool {
        false
    }
}

macro_rules! soft_deleted_scope {
    ($($ty:ty => $name:literal),+ $(,)?) => {
        $(
            impl WorkspaceScoped for $ty {
                const ENTITY: &'static str = $name;

                fn workspace_id(&self) -> Uuid {
                    self.workspace_id
                }

                fn is_removed(&self) -> bool {
                    self.removed_at.is_some()
                }
            }
        )+
    };
}

soft_deleted_scope! {
    Business => "business",
    Post => "post",
    Calendar => "calendar",
    Event => "event",
    Coupon => "coupon",
    Classified => "classified",
    Customer => "customer",
    Deal => "deal",
    Store => "store",
    Product => "product",
    Organization => "organization",
}

impl WorkspaceScoped for TicketPlan {
    const ENTITY: &'static str = "ticket plan";

    fn workspace_id(&self) -> Uuid {
        self.workspace_id
    }
}

impl WorkspaceScoped for Conversation {
    const ENTITY: &'static str = "conversation";

    fn workspace_id(&self) -> Uuid {
        self.workspace_id
    }
}

impl WorkspaceScoped for Rollout {
    const ENTITY: &'static str = "rollout";

    fn workspace_id(&self) -> Uuid {
        self.workspace_id
    }
}

/// Entities from another workspace, or removed ones, are reported as not found.
pub fn in_workspace<T: WorkspaceScoped>(found: Option<T>, workspace_id: Uuid, id: Uuid) -> Result<T, DomainError> {
    found
        .filter(|e| e.workspace_id() == workspace_id && !e.is_removed())
        .ok_or_else(|| DomainError::not_found(T::ENTITY, id))
}
