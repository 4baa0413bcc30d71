//! Shared application state

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use localhub_core::repositories::Repositories;
use localhub_core::services::{
    AuthService, BusinessService, CalendarService, ClassifiedService, CommerceService, CouponService, CrmService,
    EventService, FollowService, MessagingService, OrganizationService, PostService, RegionService, RolloutService,
    TenantService, TicketService, WorkspaceAccess, WorkspaceService,
};
use localhub_security::JwtService;
use localhub_shared::config::AppConfig;
use sqlx::PgPool;

/// Everything a handler can reach. Cloned per request, so every field is
/// behind an `Arc` or is itself a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: PgPool,
    pub jwt: Arc<JwtService>,
    pub auth_limiter: Arc<DefaultKeyedRateLimiter<String>>,

    pub auth: Arc<AuthService>,
    pub tenants: Arc<TenantService>,
    pub workspaces: Arc<WorkspaceService>,
    pub regions: Arc<RegionService>,
    pub businesses: Arc<BusinessService>,
    pub posts: Arc<PostService>,
    pub calendars: Arc<CalendarService>,
    pub events: Arc<EventService>,
    pub tickets: Arc<TicketService>,
    pub coupons: Arc<CouponService>,
    pub classifieds: Arc<ClassifiedService>,
    pub crm: Arc<CrmService>,
    pub commerce: Arc<CommerceService>,
    pub organizations: Arc<OrganizationService>,
    pub messaging: Arc<MessagingService>,
    pub rollouts: Arc<RolloutService>,
    pub follows: Arc<FollowService>,
}

impl AppState {
    pub fn new(config: AppConfig, db: PgPool, repos: Repositories) -> Self {
        let jwt = Arc::new(JwtService::new(
            &config.jwt.secret,
            config.jwt.access_token_expiry,
            config.jwt.refresh_token_expiry,
        ));
        let per_minute = NonZeroU32::new(config.rate_limit.auth_per_minute).unwrap_or(NonZeroU32::MIN);
        let auth_limiter = Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute)));
        let access = WorkspaceAccess::new(repos.members.clone());

        Self {
            auth: Arc::new(AuthService::new(repos.users.clone(), jwt.clone())),
            tenants: Arc::new(TenantService::new(repos.tenants.clone())),
            workspaces: Arc::new(WorkspaceService::new(
                repos.workspaces.clone(),
                repos.members.clone(),
                repos.tenants.clone(),
                repos.users.clone(),
            )),
            regions: Arc::new(RegionService::new(repos.regions.clone())),
            businesses: Arc::new(BusinessService::new(
                repos.businesses.clone(),
                repos.regions.clone(),
                access.clone(),
            )),
            posts: Arc::new(PostService::new(repos.posts.clone(), repos.regions.clone(), access.clone())),
            calendars: Arc::new(CalendarService::new(repos.calendars.clone(), access.clone())),
            events: Arc::new(EventService::new(
                repos.events.clone(),
                repos.calendars.clone(),
                repos.businesses.clone(),
                repos.regions.clone(),
                access.clone(),
            )),
            tickets: Arc::new(TicketService::new(repos.tickets.clone(), repos.events.clone(), access.clone())),
            coupons: Arc::new(CouponService::new(
                repos.coupons.clone(),
                repos.businesses.clone(),
                repos.regions.clone(),
                access.clone(),
            )),
            classifieds: Arc::new(ClassifiedService::new(
                repos.classifieds.clone(),
                repos.regions.clone(),
                access.clone(),
            )),
            crm: Arc::new(CrmService::new(repos.customers.clone(), repos.deals.clone(), access.clone())),
            commerce: Arc::new(CommerceService::new(
                repos.stores.clone(),
                repos.products.clone(),
                repos.businesses.clone(),
                access.clone(),
            )),
            organizations: Arc::new(OrganizationService::new(
                repos.organizations.clone(),
                repos.regions.clone(),
                access.clone(),
            )),
            messaging: Arc::new(MessagingService::new(
                repos.conversations.clone(),
                repos.members.clone(),
                access.clone(),
            )),
            rollouts: Arc::new(RolloutService::new(repos.rollouts.clone(), access.clone())),
            follows: Arc::new(FollowService::new(
                repos.follows.clone(),
                repos.businesses.clone(),
                repos.calendars.clone(),
                repos.organizations.clone(),
                access,
            )),
            config: Arc::new(config),
            db,
            jwt,
            auth_limiter,
        }
    }
}
