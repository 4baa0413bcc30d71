// ============================================================================
// LocalHub API - Router
// File: crates/localhub-api/src/routes.rs
// ============================================================================
//! Route table and the tower-http middleware stack.
//!
//! Workspace-scoped resources live under `/api/v1/workspaces/{ws}/...`.
//! Public reads take `MaybeUser`; everything else takes `AuthUser`.

use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderValue, Request, Uri},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    error::ApiError,
    handlers::{
        auth, businesses, calendars, classifieds, commerce, coupons, crm, events, follows, health, messaging,
        organizations, posts, regions, rollouts, tenants, tickets, workspaces,
    },
    middleware::limit_auth,
    state::AppState,
};

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", auth_routes(&state))
        .merge(account_routes())
        .merge(directory_routes())
        .merge(content_routes())
        .merge(business_tool_routes());

    let layers = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        }))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(Duration::from_secs(state.config.app.request_timeout_secs)))
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config.app.cors_origins));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .nest("/api/v1", api)
        .fallback(not_found)
        .layer(layers)
        .with_state(state)
}

/// Credential endpoints share one keyed rate limiter; `/me` is not throttled.
fn auth_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route_layer(middleware::from_fn_with_state(state.clone(), limit_auth))
        .route("/me", get(auth::me))
}

/// Tenancy, membership and the caller's own lists.
fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/tenants", get(tenants::list).post(tenants::create))
        .route("/tenants/{id}", get(tenants::get).put(tenants::update).delete(tenants::deactivate))
        .route("/tenants/{id}/workspaces", get(tenants::workspaces))
        .route("/workspaces", get(workspaces::list_mine).post(workspaces::create))
        .route(
            "/workspaces/{ws}",
            get(workspaces::get).put(workspaces::update).delete(workspaces::delete),
        )
        .route(
            "/workspaces/{ws}/members",
            get(workspaces::list_members).post(workspaces::add_member),
        )
        .route(
            "/workspaces/{ws}/members/{user_id}",
            put(workspaces::change_role).delete(workspaces::remove_member),
        )
        .route("/ticket-orders", get(tickets::my_orders))
        .route("/ticket-orders/{id}/cancel", post(tickets::cancel_order))
        .route("/me/follows", get(follows::my_follows))
}

/// Regions, businesses and organizations.
fn directory_routes() -> Router<AppState> {
    Router::new()
        .route("/regions", get(regions::list).post(regions::create))
        .route("/regions/{id}", get(regions::get).put(regions::update).delete(regions::delete))
        .route(
            "/workspaces/{ws}/businesses",
            get(businesses::list).post(businesses::create),
        )
        .route(
            "/workspaces/{ws}/businesses/{id}",
            get(businesses::get).put(businesses::update).delete(businesses::delete),
        )
        .route("/workspaces/{ws}/businesses/{id}/claim", post(businesses::claim))
        .route("/workspaces/{ws}/businesses/{id}/verify", post(businesses::verify))
        .route(
            "/workspaces/{ws}/businesses/{id}/follow",
            get(follows::business_status)
                .post(follows::follow_business)
                .delete(follows::unfollow_business),
        )
        .route(
            "/workspaces/{ws}/organizations",
            get(organizations::list).post(organizations::create),
        )
        .route(
            "/workspaces/{ws}/organizations/{id}",
            get(organizations::get).put(organizations::update).delete(organizations::delete),
        )
        .route(
            "/workspaces/{ws}/organizations/{id}/follow",
            get(follows::organization_status)
                .post(follows::follow_organization)
                .delete(follows::unfollow_organization),
        )
}

/// Posts, calendars, events and tickets, coupons, classifieds.
fn content_routes() -> Router<AppState> {
    Router::new()
        .route("/workspaces/{ws}/posts", get(posts::list).post(posts::create))
        .route(
            "/workspaces/{ws}/posts/{id}",
            get(posts::get).put(posts::update).delete(posts::delete),
        )
        .route("/workspaces/{ws}/posts/{id}/submit", post(posts::submit))
        .route("/workspaces/{ws}/posts/{id}/publish", post(posts::publish))
        .route("/workspaces/{ws}/posts/{id}/approve", post(posts::approve))
        .route("/workspaces/{ws}/posts/{id}/reject", post(posts::reject))
        .route("/workspaces/{ws}/posts/{id}/archive", post(posts::archive))
        .route("/workspaces/{ws}/calendars", get(calendars::list).post(calendars::create))
        .route(
            "/workspaces/{ws}/calendars/{id}",
            get(calendars::get).put(calendars::update).delete(calendars::delete),
        )
        .route(
            "/workspaces/{ws}/calendars/{id}/follow",
            get(follows::calendar_status)
                .post(follows::follow_calendar)
                .delete(follows::unfollow_calendar),
        )
        .route("/workspaces/{ws}/events", get(events::list).post(events::create))
        .route(
            "/workspaces/{ws}/events/{id}",
            get(events::get).put(events::update).delete(events::delete),
        )
        .route("/workspaces/{ws}/events/{id}/publish", post(events::publish))
        .route("/workspaces/{ws}/events/{id}/cancel", post(events::cancel))
        .route("/workspaces/{ws}/events/{id}/rsvp", post(events::rsvp))
        .route("/workspaces/{ws}/events/{id}/attendees", get(events::attendees))
        .route(
            "/workspaces/{ws}/events/{id}/ticket-plans",
            get(tickets::list_plans).post(tickets::create_plan),
        )
        .route(
            "/workspaces/{ws}/ticket-plans/{id}",
            put(tickets::update_plan).delete(tickets::delete_plan),
        )
        .route("/workspaces/{ws}/ticket-plans/{id}/purchase", post(tickets::purchase))
        .route("/workspaces/{ws}/coupons", get(coupons::list).post(coupons::create))
        .route(
            "/workspaces/{ws}/coupons/{id}",
            get(coupons::get).put(coupons::update).delete(coupons::delete),
        )
        .route("/workspaces/{ws}/coupons/{id}/submit", post(coupons::submit))
        .route("/workspaces/{ws}/coupons/{id}/approve", post(coupons::approve))
        .route("/workspaces/{ws}/coupons/{id}/reject", post(coupons::reject))
        .route("/workspaces/{ws}/coupons/{id}/vote", post(coupons::vote))
        .route("/workspaces/{ws}/coupons/{id}/claim", post(coupons::claim))
        .route(
            "/workspaces/{ws}/classifieds",
            get(classifieds::list).post(classifieds::create),
        )
        .route(
            "/workspaces/{ws}/classifieds/{id}",
            get(classifieds::get).put(classifieds::update).delete(classifieds::delete),
        )
        .route("/workspaces/{ws}/classifieds/{id}/approve", post(classifieds::approve))
        .route("/workspaces/{ws}/classifieds/{id}/reject", post(classifieds::reject))
        .route("/workspaces/{ws}/classifieds/{id}/sold", post(classifieds::mark_sold))
}

/// CRM, commerce, messaging and rollouts.
fn business_tool_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/workspaces/{ws}/customers",
            get(crm::list_customers).post(crm::create_customer),
        )
        .route(
            "/workspaces/{ws}/customers/{id}",
            get(crm::get_customer).put(crm::update_customer).delete(crm::delete_customer),
        )
        .route("/workspaces/{ws}/deals", get(crm::list_deals).post(crm::create_deal))
        .route("/workspaces/{ws}/deals/pipeline", get(crm::pipeline))
        .route(
            "/workspaces/{ws}/deals/{id}",
            get(crm::get_deal).put(crm::update_deal).delete(crm::delete_deal),
        )
        .route("/workspaces/{ws}/deals/{id}/stage", post(crm::move_stage))
        .route(
            "/workspaces/{ws}/stores",
            get(commerce::list_stores).post(commerce::create_store),
        )
        .route(
            "/workspaces/{ws}/stores/{id}",
            get(commerce::get_store).put(commerce::update_store).delete(commerce::delete_store),
        )
        .route("/workspaces/{ws}/stores/{id}/publish", post(commerce::publish_store))
        .route("/workspaces/{ws}/stores/{id}/unpublish", post(commerce::unpublish_store))
        .route(
            "/workspaces/{ws}/stores/{id}/products",
            get(commerce::list_products).post(commerce::create_product),
        )
        .route(
            "/workspaces/{ws}/stores/{id}/products/{product_id}",
            get(commerce::get_product)
                .put(commerce::update_product)
                .delete(commerce::delete_product),
        )
        .route(
            "/workspaces/{ws}/conversations",
            get(messaging::list_conversations).post(messaging::start),
        )
        .route(
            "/workspaces/{ws}/conversations/{id}/messages",
            get(messaging::list_messages).post(messaging::send),
        )
        .route("/workspaces/{ws}/rollouts", get(rollouts::list).post(rollouts::create))
        .route(
            "/workspaces/{ws}/rollouts/{id}",
            get(rollouts::get).put(rollouts::update).delete(rollouts::delete),
        )
        .route("/workspaces/{ws}/rollouts/{id}/start", post(rollouts::start))
        .route("/workspaces/{ws}/rollouts/{id}/pause", post(rollouts::pause))
        .route("/workspaces/{ws}/rollouts/{id}/resume", post(rollouts::resume))
        .route("/workspaces/{ws}/rollouts/{id}/advance", post(rollouts::advance))
        .route("/workspaces/{ws}/rollouts/{id}/complete", post(rollouts::complete))
        .route("/workspaces/{ws}/rollouts/{id}/cancel", post(rollouts::cancel))
        .route("/workspaces/{ws}/rollouts/{id}/check", get(rollouts::check))
}

/// Configured origins, or any origin when none are set.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };
    CorsLayer::new().allow_origin(allow_origin).allow_methods(Any).allow_headers(Any)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::name::en::Name;
    use fake::Fake;
    use localhub_core::repositories::*;
    use localhub_core::{BusinessStatus, User};
    use localhub_shared::config::AppConfig;
    use localhub_shared::Page;
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;

    fn mock_repos() -> Repositories {
        Repositories {
            users: Arc::new(MockUserRepository::new()),
            tenants: Arc::new(MockTenantRepository::new()),
            workspaces: Arc::new(MockWorkspaceRepository::new()),
            members: Arc::new(MockMemberRepository::new()),
            regions: Arc::new(MockRegionRepository::new()),
            businesses: Arc::new(MockBusinessRepository::new()),
            posts: Arc::new(MockPostRepository::new()),
            calendars: Arc::new(MockCalendarRepository::new()),
            events: Arc::new(MockEventRepository::new()),
            tickets: Arc::new(MockTicketRepository::new()),
            coupons: Arc::new(MockCouponRepository::new()),
            classifieds: Arc::new(MockClassifiedRepository::new()),
            customers: Arc::new(MockCustomerRepository::new()),
            deals: Arc::new(MockDealRepository::new()),
            stores: Arc::new(MockStoreRepository::new()),
            products: Arc::new(MockProductRepository::new()),
            organizations: Arc::new(MockOrganizationRepository::new()),
            conversations: Arc::new(MockConversationRepository::new()),
            rollouts: Arc::new(MockRolloutRepository::new()),
            follows: Arc::new(MockFollowRepository::new()),
        }
    }

    fn state(repos: Repositories) -> AppState {
        let config: AppConfig = AppConfig::builder()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        // Never connects: only the readiness probe touches the pool.
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .unwrap();
        AppState::new(config, pool, repos)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, body)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_is_ok() {
        let app = create_router(state(mock_repos()));
        let (status, body) = send(app, Request::get("/health").body(Body::empty()).unwrap()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404_envelope() {
        let app = create_router(state(mock_repos()));
        let (status, body) = send(app, Request::get("/api/v1/nowhere").body(Body::empty()).unwrap()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_me_without_token_is_401() {
        let app = create_router(state(mock_repos()));
        let (status, body) = send(app, Request::get("/api/v1/auth/me").body(Body::empty()).unwrap()).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let state = state(mock_repos());
        let refresh = state.jwt.generate_refresh_token(&Uuid::new_v4()).unwrap();
        let app = create_router(state);

        let request = Request::get("/api/v1/auth/me")
            .header(header::AUTHORIZATION, format!("Bearer {}", refresh))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app, request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_with_valid_token_returns_user() {
        let email: String = SafeEmail().fake();
        let name: String = Name().fake();
        let user = User::new(&name, &email, "hash".into());
        let user_id = user.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .withf(move |id| *id == user_id)
            .returning(move |_| Ok(Some(user.clone())));
        let mut repos = mock_repos();
        repos.users = Arc::new(users);

        let state = state(repos);
        let token = state.jwt.generate_access_token(&user_id).unwrap();
        let app = create_router(state);

        let request = Request::get("/api/v1/auth/me")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], email.to_lowercase());
        assert!(body["data"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_register_validation_failure_is_422_with_fields() {
        let app = create_router(state(mock_repos()));
        let request = json_request(
            Method::POST,
            "/api/v1/auth/register",
            json!({ "name": "J", "email": "not-an-email", "password": "short" }),
        );
        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["fields"]["name"].is_array());
        assert!(body["error"]["fields"]["email"].is_array());
        assert!(body["error"]["fields"]["password"].is_array());
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let app = create_router(state(mock_repos()));
        let request = Request::post("/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_bad_path_id_is_400() {
        let app = create_router(state(mock_repos()));
        let (status, _) = send(app, Request::get("/api/v1/regions/not-a-uuid").body(Body::empty()).unwrap()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_anonymous_business_list_only_sees_active() {
        let ws = Uuid::new_v4();
        let mut businesses = MockBusinessRepository::new();
        businesses
            .expect_list()
            .withf(move |w, filter, p| *w == ws && filter.status == Some(BusinessStatus::Active) && p.page == 2)
            .returning(|_, _, p| Ok(Page::empty(p)));
        let mut repos = mock_repos();
        repos.businesses = Arc::new(businesses);
        let app = create_router(state(repos));

        let uri = format!("/api/v1/workspaces/{}/businesses?page=2&status=inactive", ws);
        let (status, body) = send(app, Request::get(uri).body(Body::empty()).unwrap()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 0);
    }

    #[tokio::test]
    async fn test_crm_requires_membership() {
        let ws = Uuid::new_v4();
        let mut members = MockMemberRepository::new();
        members.expect_find().returning(|_, _| Ok(None));
        let mut repos = mock_repos();
        repos.members = Arc::new(members);

        let state = state(repos);
        let token = state.jwt.generate_access_token(&Uuid::new_v4()).unwrap();
        let app = create_router(state);

        let request = Request::get(format!("/api/v1/workspaces/{}/customers", ws))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_auth_routes_are_rate_limited() {
        let state = state(mock_repos());
        let limit = state.config.rate_limit.auth_per_minute;
        let app = create_router(state);

        let mut last = StatusCode::OK;
        for _ in 0..=limit {
            let request = Request::post("/api/v1/auth/refresh")
                .header("x-forwarded-for", "203.0.113.7")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap();
            last = app.clone().oneshot(request).await.unwrap().status();
        }

        assert_eq!(last, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_response_carries_request_id() {
        let app = create_router(state(mock_repos()));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().contains_key("x-request-id"));
    }
}
