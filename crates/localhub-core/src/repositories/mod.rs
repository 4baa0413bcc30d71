//! Repository traits (ports)
//!
//! With the `mocks` feature (always on under `cfg(test)`) every trait also
//! gets a mockall `MockXxx` implementation.

pub mod user_repository;
pub mod tenant_repository;
pub mod workspace_repository;
pub mod region_repository;
pub mod business_repository;
pub mod post_repository;
pub mod calendar_repository;
pub mod event_repository;
pub mod ticket_repository;
pub mod coupon_repository;
pub mod classified_repository;
pub mod crm_repository;
pub mod commerce_repository;
pub mod organization_repository;
pub mod conversation_repository;
pub mod rollout_repository;
pub mod follow_repository;

pub use user_repository::UserRepository;
pub use tenant_repository::TenantRepository;
pub use workspace_repository::{MemberRepository, WorkspaceRepository};
pub use region_repository::RegionRepository;
pub use business_repository::BusinessRepository;
pub use post_repository::PostRepository;
pub use calendar_repository::CalendarRepository;
pub use event_repository::EventRepository;
pub use ticket_repository::TicketRepository;
pub use coupon_repository::CouponRepository;
pub use classified_repository::ClassifiedRepository;
pub use crm_repository::{CustomerRepository, DealRepository};
pub use commerce_repository::{ProductRepository, StoreRepository};
pub use organization_repository::OrganizationRepository;
pub use conversation_repository::ConversationRepository;
pub use rollout_repository::RolloutRepository;
pub use follow_repository::FollowRepository;

use std::sync::Arc;

/// Every port the services need, as shared trait objects. The server fills
/// it from PostgreSQL; router tests fill it with mocks.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub tenants: Arc<dyn TenantRepository>,
    pub workspaces: Arc<dyn WorkspaceRepository>,
    pub members: Arc<dyn MemberRepository>,
    pub regions: Arc<dyn RegionRepository>,
    pub businesses: Arc<dyn BusinessRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub calendars: Arc<dyn CalendarRepository>,
    pub events: Arc<dyn EventRepository>,
    pub tickets: Arc<dyn TicketRepository>,
    pub coupons: Arc<dyn CouponRepository>,
    pub classifieds: Arc<dyn ClassifiedRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub deals: Arc<dyn DealRepository>,
    pub stores: Arc<dyn StoreRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub organizations: Arc<dyn OrganizationRepository>,
    pub conversations: Arc<dyn ConversationRepository>,
    pub rollouts: Arc<dyn RolloutRepository>,
    pub follows: Arc<dyn FollowRepository>,
}

#[cfg(any(test, feature = "mocks"))]
pub use self::{
    business_repository::MockBusinessRepository,
    calendar_repository::MockCalendarRepository,
    classified_repository::MockClassifiedRepository,
    commerce_repository::{MockProductRepository, MockStoreRepository},
    conversation_repository::MockConversationRepository,
    coupon_repository::MockCouponRepository,
    crm_repository::{MockCustomerRepository, MockDealRepository},
    event_repository::MockEventRepository,
    follow_repository::MockFollowRepository,
    organization_repository::MockOrganizationRepository,
    post_repository::MockPostRepository,
    region_repository::MockRegionRepository,
    rollout_repository::MockRolloutRepository,
    tenant_repository::MockTenantRepository,
    ticket_repository::MockTicketRepository,
    user_repository::MockUserRepository,
    workspace_repository::{MockMemberRepository, MockWorkspaceRepository},
};
