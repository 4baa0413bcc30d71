//! Direct conversations between workspace members.

use axum::extract::State;
use localhub_core::{Conversation, Message, SendMessage, StartConversation};
use localhub_shared::{Page, Pagination};
use uuid::Uuid;

use crate::{
    extract::{ApiJson, ApiPath, ApiQuery},
    middleware::AuthUser,
    response::{created, ok, ApiResult, Created},
    state::AppState,
};

pub async fn list_conversations(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Conversation>> {
    Ok(ok(state.messaging.list_for_user(ws, user_id, pagination).await?))
}

pub async fn start(
    State(state): State<AppState>,
    ApiPath(ws): ApiPath<Uuid>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<StartConversation>,
) -> Created<Conversation> {
    Ok(created(state.messaging.start(ws, user_id, input).await?))
}

/// Newest first.
pub async fn list_messages(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> ApiResult<Page<Message>> {
    Ok(ok(state.messaging.list_messages(ws, id, user_id, pagination).await?))
}

pub async fn send(
    State(state): State<AppState>,
    ApiPath((ws, id)): ApiPath<(Uuid, Uuid)>,
    AuthUser(user_id): AuthUser,
    ApiJson(input): ApiJson<SendMessage>,
) -> Created<Message> {
    Ok(created(state.messaging.send(ws, id, user_id, input).await?))
}
