//! Per-client throttling for the credential endpoints.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::{error::ApiError, state::AppState};

/// Client key: first `X-Forwarded-For` hop, then the peer address, then a
/// shared bucket when neither is known.
fn client_key(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
    {
        return forwarded.trim().to_string();
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn limit_auth(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, ApiError> {
    let key = client_key(&req);
    if state.auth_limiter.check_key(&key).is_err() {
        tracing::warn!(client = %key, path = %req.uri().path(), "Auth rate limit exceeded");
        return Err(ApiError::RateLimited);
    }
    Ok(next.run(req).await)
}
