//! Workspace conversations and messages

use chrono::{DateTime, Utc};
use localhub_shared::utils::normalize_optional;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{validate_not_blank, Validated};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub subject: Option<String>,
    pub participant_ids: Vec<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StartConversation {
    #[validate(length(max = 255, message = "Subject may not exceed 255 characters"))]
    pub subject: Option<String>,

    #[validate(length(min = 1, max = 50, message = "Add between 1 and 50 participants"))]
    pub participant_ids: Vec<Uuid>,

    #[validate(nested)]
    pub message: SendMessage,
}

impl Validated for StartConversation {}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendMessage {
    #[validate(
        length(min = 1, max = 5000, message = "Message must be between 1 and 5000 characters"),
        custom(function = "validate_not_blank")
    )]
    pub body: String,
}

impl Validated for SendMessage {}

impl Conversation {
    /// The sender is always a participant.
    pub fn start(workspace_id: Uuid, input: &StartConversation, sender_id: Uuid) -> Self {
        let mut participants = input.participant_ids.clone();
        participants.push(sender_id);
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            subject: normalize_optional(input.subject.clone()),
            participant_ids: super::dedup_ids(participants),
            created_by: sender_id,
            created_at: Utc::now(),
            last_message_at: None,
        }
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.participant_ids.contains(&user_id)
    }

    /// Participants other than the sender, for membership checks.
    pub fn others(&self, sender_id: Uuid) -> impl Iterator<Item = Uuid> + '_ {
        self.participant_ids.iter().copied().filter(move |id| *id != sender_id)
    }
}

impl Message {
    pub fn new(conversation_id: Uuid, sender_id: Uuid, body: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            body: body.trim().to_string(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_joins_conversation() {
        let sender = Uuid::new_v4();
        let other = Uuid::new_v4();
        let input = StartConversation {
            subject: Some("Booth setup".into()),
            participant_ids: vec![other, other, sender],
            message: SendMessage { body: "Who brings the tables?".into() },
        };
        let conversation = Conversation::start(Uuid::new_v4(), &input, sender);
        assert_eq!(conversation.participant_ids.len(), 2);
        assert!(conversation.is_participant(sender));
        assert_eq!(conversation.others(sender).collect::<Vec<_>>(), vec![other]);
    }

    #[test]
    fn test_message_rules() {
        let input = StartConversation {
            subject: None,
            participant_ids: vec![],
            message: SendMessage { body: "   ".into() },
        };
        let errors = input.field_errors();
        assert!(errors.contains("participant_ids"));
        assert!(errors.contains("message.body"));
    }
}
