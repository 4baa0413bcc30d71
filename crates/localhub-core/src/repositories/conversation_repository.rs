//! Conversation repository trait (port)

use async_trait::async_trait;
use localhub_shared::types::{Page, Pagination};
use uuid::Uuid;

use crate::domain::{Conversation, Message};
use crate::error::DomainError;

#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Conversation>, DomainError>;
    /// Stores the conversation together with its opening message.
    async fn create_with_message(&self, conversation: &Conversation, message: &Message) -> Result<Conversation, DomainError>;
    /// Most recently active first.
    async fn list_for_user(&self, workspace_id: &Uuid, user_id: &Uuid, pagination: Pagination) -> Result<Page<Conversation>, DomainError>;
    /// Inserts the message and moves `last_message_at`.
    async fn add_message(&self, message: &Message) -> Result<Message, DomainError>;
    /// Newest first.
    async fn list_messages(&self, conversation_id: &Uuid, pagination: Pagination) -> Result<Page<Message>, DomainError>;
}
