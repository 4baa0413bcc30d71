//! Direct messaging between workspace members

use std::sync::Arc;

use localhub_shared::types::{Page, Pagination};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Conversation, Message, SendMessage, StartConversation, WorkspaceRole};
use crate::error::DomainError;
use crate::repositories::{ConversationRepository, MemberRepository};
use crate::services::access::WorkspaceAccess;
use crate::services::scope::in_workspace;
use crate::validation::Validated;

pub struct MessagingService {
    conversations: Arc<dyn ConversationRepository>,
    members: Arc<dyn MemberRepository>,
    access: WorkspaceAccess,
}

impl MessagingService {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        members: Arc<dyn MemberRepository>,
        access: WorkspaceAccess,
    ) -> Self {
        Self { conversations, members, access }
    }

    /// Opens a conversation with its first message. Every participant must
    /// belong to the workspace.
    pub async fn start(&self, workspace_id: Uuid, sender_id: Uuid, input: StartConversation) -> Result<Conversation, DomainError> {
        // 1. Sender membership
        self.access.require(workspace_id, sender_id, WorkspaceRole::Member).await?;

        // 2. Input and participant membership
        let mut errors = input.field_errors();
        let conversation = Conversation::start(workspace_id, &input, sender_id);
        let others: Vec<Uuid> = conversation.others(sender_id).collect();
        if others.is_empty() {
            if !input.participant_ids.is_empty() {
                errors.add("participant_ids", "A conversation needs at least one other participant");
            }
        } else {
            for outsider in self.members.find_non_members(&workspace_id, &others).await? {
                errors.add("participant_ids", format!("User {} is not a member of this workspace", outsider));
            }
        }
        errors.into_result()?;

        // 3. Persist with the opening message
        let message = Message::new(conversation.id, sender_id, &input.message.body);
        let conversation = self.conversations.create_with_message(&conversation, &message).await?;
        info!(
            conversation_id = %conversation.id,
            %workspace_id,
            participants = conversation.participant_ids.len(),
            "Conversation started"
        );
        Ok(conversation)
    }

    pub async fn list_for_user(&self, workspace_id: Uuid, user_id: Uuid, pagination: Pagination) -> Result<Page<Conversation>, DomainError> {
        self.access.require(workspace_id, user_id, WorkspaceRole::Member).await?;
        self.conversations.list_for_user(&workspace_id, &user_id, pagination).await
    }

    pub async fn send(
        &self,
        workspace_id: Uuid,
        conversation_id: Uuid,
        sender_id: Uuid,
        input: SendMessage,
    ) -> Result<Message, DomainError> {
        input.check()?;
        self.load_for(workspace_id, conversation_id, sender_id).await?;

        let message = self
            .conversations
            .add_message(&Message::new(conversation_id, sender_id, &input.body))
            .await?;
        info!(%conversation_id, message_id = %message.id, "Message sent");
        Ok(message)
    }

    /// Newest first.
    pub async fn list_messages(
        &self,
        workspace_id: Uuid,
        conversation_id: Uuid,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<Page<Message>, DomainError> {
        self.load_for(workspace_id, conversation_id, user_id).await?;
        self.conversations.list_messages(&conversation_id, pagination).await
    }

    /// Conversations are invisible to anyone outside them.
    async fn load_for(&self, workspace_id: Uuid, id: Uuid, user_id: Uuid) -> Result<Conversation, DomainError> {
        let conversation = in_workspace(self.conversations.find_by_id(&id).await?, workspace_id, id)?;
        if !conversation.is_participant(user_id) {
            warn!(conversation_id = %id, %user_id, "Conversation access by non-participant");
            return Err(DomainError::not_found("conversation", id));
        }
        Ok(conversation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MockConversationRepository, MockMemberRepository};
    use crate::services::testing::access;

    fn start_input(participants: Vec<Uuid>) -> StartConversation {
        StartConversation {
            subject: Some("Farmers market stall".into()),
            participant_ids: participants,
            message: SendMessage { body: "Can we share the corner spot?".into() },
        }
    }

    fn members(outsiders: Vec<Uuid>) -> MockMemberRepository {
        let mut members = MockMemberRepository::new();
        members
            .expect_find_non_members()
            .returning(move |_, ids| Ok(ids.iter().copied().filter(|id| outsiders.contains(id)).collect()));
        members
    }

    #[tokio::test]
    async fn test_start_rejects_non_members() {
        let outsider = Uuid::new_v4();
        let mut conversations = MockConversationRepository::new();
        conversations.expect_create_with_message().never();
        let service = MessagingService::new(
            Arc::new(conversations),
            Arc::new(members(vec![outsider])),
            access(Some(WorkspaceRole::Member)),
        );

        match service.start(Uuid::new_v4(), Uuid::new_v4(), start_input(vec![outsider])).await {
            Err(DomainError::Validation(errors)) => assert!(errors.contains("participant_ids")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_start_adds_sender() {
        let sender = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut conversations = MockConversationRepository::new();
        conversations
            .expect_create_with_message()
            .withf(move |c, m| c.id == m.conversation_id && m.sender_id == sender)
            .returning(|c, _| Ok(c.clone()));
        let service = MessagingService::new(
            Arc::new(conversations),
            Arc::new(members(vec![])),
            access(Some(WorkspaceRole::Member)),
        );

        let conversation = service.start(Uuid::new_v4(), sender, start_input(vec![other])).await.unwrap();
        assert!(conversation.is_participant(sender));
        assert!(conversation.is_participant(other));
    }

    #[tokio::test]
    async fn test_only_participants_send() {
        let ws = Uuid::new_v4();
        let sender = Uuid::new_v4();
        let conversation = Conversation::start(ws, &start_input(vec![Uuid::new_v4()]), sender);
        let id = conversation.id;
        let mut conversations = MockConversationRepository::new();
        conversations.expect_find_by_id().returning(move |_| Ok(Some(conversation.clone())));
        conversations.expect_add_message().times(1).returning(|m| Ok(m.clone()));
        let service = MessagingService::new(Arc::new(conversations), Arc::new(members(vec![])), access(Some(WorkspaceRole::Member)));

        let body = SendMessage { body: "See you Saturday".into() };
        let result = service.send(ws, id, Uuid::new_v4(), body.clone()).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
        let message = service.send(ws, id, sender, body).await.unwrap();
        assert_eq!(message.conversation_id, id);
    }
}
