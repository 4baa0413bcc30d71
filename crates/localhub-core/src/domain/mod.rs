//! # LocalHub Core - Domain Module
//! 
//! Domain entities, their input types and validation rules.

/// Declares a text-backed enum; the string form is what the database and
/// the JSON API both use.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn from_str(s: &str) -> Option<Self> {
                match s {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod user;
pub mod tenant;
pub mod workspace;
pub mod region;
pub mod business;
pub mod post;
pub mod calendar;
pub mod event;
pub mod ticket;
pub mod coupon;
pub mod classified;
pub mod customer;
pub mod deal;
pub mod store;
pub mod product;
pub mod organization;
pub mod conversation;
pub mod rollout;
pub mod follow;

// Re-export all entities and enums
pub use user::{User, RegisterUser, LoginUser};
pub use tenant::{Tenant, SubscriptionPlan, NewTenant, TenantUpdate};
pub use workspace::{Workspace, WorkspaceMember, WorkspaceRole, NewWorkspace, WorkspaceUpdate, AddMember, ChangeMemberRole};
pub use region::{Region, RegionKind, NewRegion, RegionUpdate, RegionFilter};
pub use business::{Business, BusinessStatus, NewBusiness, BusinessUpdate, BusinessFilter};
pub use post::{Post, PostStatus, NewPost, PostUpdate, PostFilter, RejectPost};
pub use calendar::{Calendar, NewCalendar, CalendarUpdate};
pub use event::{Event, EventStatus, EventRsvp, RsvpStatus, NewEvent, EventUpdate, EventFilter, RsvpRequest};
pub use ticket::{TicketPlan, TicketOrder, TicketOrderStatus, NewTicketPlan, TicketPlanUpdate, PurchaseTickets};
pub use coupon::{Coupon, CouponStatus, DiscountType, CouponVote, VoteDirection, CouponClaim, NewCoupon, CouponUpdate, CouponFilter, CouponSort, CastVote, RejectCoupon};
pub use classified::{Classified, ClassifiedStatus, ItemCondition, NewClassified, ClassifiedUpdate, ClassifiedFilter, RejectClassified};
pub use customer::{Customer, LifecycleStage, NewCustomer, CustomerUpdate, CustomerFilter};
pub use deal::{Deal, PipelineStage, NewDeal, DealUpdate, DealFilter, MoveDealStage, StageSummary};
pub use store::{Store, NewStore, StoreUpdate};
pub use product::{Product, NewProduct, ProductUpdate};
pub use organization::{Organization, OrganizationKind, NewOrganization, OrganizationUpdate, OrganizationFilter};
pub use conversation::{Conversation, Message, StartConversation, SendMessage};
pub use rollout::{Rollout, RolloutStatus, NewRollout, RolloutUpdate};
pub use follow::{Follow, FollowableKind, FollowQuery};

/// Sorts and removes duplicates so region lists compare and store cleanly.
pub(crate) fn dedup_ids(mut ids: Vec<uuid::Uuid>) -> Vec<uuid::Uuid> {
    ids.sort();
    ids.dedup();
    ids
}
