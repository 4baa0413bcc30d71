//! PostgreSQL repository implementations

mod support;

pub mod user_repo_impl;
pub mod tenant_repo_impl;
pub mod workspace_repo_impl;
pub mod region_repo_impl;
pub mod business_repo_impl;
pub mod post_repo_impl;
pub mod calendar_repo_impl;
pub mod event_repo_impl;
pub mod ticket_repo_impl;
pub mod coupon_repo_impl;
pub mod classified_repo_impl;
pub mod crm_repo_impl;
pub mod commerce_repo_impl;
pub mod organization_repo_impl;
pub mod conversation_repo_impl;
pub mod rollout_repo_impl;
pub mod follow_repo_impl;

use std::sync::Arc;

use localhub_core::repositories::Repositories;
use sqlx::PgPool;

pub use business_repo_impl::PgBusinessRepository;
pub use calendar_repo_impl::PgCalendarRepository;
pub use classified_repo_impl::PgClassifiedRepository;
pub use commerce_repo_impl::{PgProductRepository, PgStoreRepository};
pub use conversation_repo_impl::PgConversationRepository;
pub use coupon_repo_impl::PgCouponRepository;
pub use crm_repo_impl::{PgCustomerRepository, PgDealRepository};
pub use event_repo_impl::PgEventRepository;
pub use follow_repo_impl::PgFollowRepository;
pub use organization_repo_impl::PgOrganizationRepository;
pub use post_repo_impl::PgPostRepository;
pub use region_repo_impl::PgRegionRepository;
pub use rollout_repo_impl::PgRolloutRepository;
pub use tenant_repo_impl::PgTenantRepository;
pub use ticket_repo_impl::PgTicketRepository;
pub use user_repo_impl::PgUserRepository;
pub use workspace_repo_impl::{PgMemberRepository, PgWorkspaceRepository};

/// Every repository behind its port, sharing one pool.
pub fn pg_repositories(pool: PgPool) -> Repositories {
    Repositories {
        users: Arc::new(PgUserRepository::new(pool.clone())),
        tenants: Arc::new(PgTenantRepository::new(pool.clone())),
        workspaces: Arc::new(PgWorkspaceRepository::new(pool.clone())),
        members: Arc::new(PgMemberRepository::new(pool.clone())),
        regions: Arc::new(PgRegionRepository::new(pool.clone())),
        businesses: Arc::new(PgBusinessRepository::new(pool.clone())),
        posts: Arc::new(PgPostRepository::new(pool.clone())),
        calendars: Arc::new(PgCalendarRepository::new(pool.clone())),
        events: Arc::new(PgEventRepository::new(pool.clone())),
        tickets: Arc::new(PgTicketRepository::new(pool.clone())),
        coupons: Arc::new(PgCouponRepository::new(pool.clone())),
        classifieds: Arc::new(PgClassifiedRepository::new(pool.clone())),
        customers: Arc::new(PgCustomerRepository::new(pool.clone())),
        deals: Arc::new(PgDealRepository::new(pool.clone())),
        stores: Arc::new(PgStoreRepository::new(pool.clone())),
        products: Arc::new(PgProductRepository::new(pool.clone())),
        organizations: Arc::new(PgOrganizationRepository::new(pool.clone())),
        conversations: Arc::new(PgConversationRepository::new(pool.clone())),
        rollouts: Arc::new(PgRolloutRepository::new(pool.clone())),
        follows: Arc::new(PgFollowRepository::new(pool)),
    }
}
