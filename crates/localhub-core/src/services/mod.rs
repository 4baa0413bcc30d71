//! Domain services (business logic)

pub mod access;
pub mod scope;
pub mod auth_service;
pub mod tenant_service;
pub mod workspace_service;
pub mod region_service;
pub mod business_service;
pub mod post_service;
pub mod calendar_service;
pub mod event_service;
pub mod ticket_service;
pub mod coupon_service;
pub mod classified_service;
pub mod crm_service;
pub mod commerce_service;
pub mod organization_service;
pub mod messaging_service;
pub mod rollout_service;
pub mod follow_service;

pub use access::WorkspaceAccess;
pub use auth_service::{AuthService, AuthSession};
pub use tenant_service::TenantService;
pub use workspace_service::WorkspaceService;
pub use region_service::RegionService;
pub use business_service::BusinessService;
pub use post_service::PostService;
pub use calendar_service::CalendarService;
pub use event_service::EventService;
pub use ticket_service::TicketService;
pub use coupon_service::CouponService;
pub use classified_service::ClassifiedService;
pub use crm_service::CrmService;
pub use commerce_service::CommerceService;
pub use organization_service::OrganizationService;
pub use messaging_service::MessagingService;
pub use rollout_service::{RolloutCheck, RolloutService};
pub use follow_service::FollowService;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::domain::{WorkspaceMember, WorkspaceRole};
    use crate::repositories::MockMemberRepository;
    use crate::services::WorkspaceAccess;

    /// Access helper where every caller holds `role` (or is no member at all).
    pub fn access(role: Option<WorkspaceRole>) -> WorkspaceAccess {
        let mut members = MockMemberRepository::new();
        members
            .expect_find()
            .returning(move |w, u| Ok(role.map(|r| WorkspaceMember::new(*w, *u, r, None))));
        WorkspaceAccess::new(Arc::new(members))
    }
}
