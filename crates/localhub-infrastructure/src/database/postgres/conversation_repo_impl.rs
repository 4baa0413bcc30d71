// ============================================================================
// LocalHub Infrastructure - PostgreSQL Conversation Repository
// File: crates/localhub-infrastructure/src/database/postgres/conversation_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use localhub_shared::types::{Page, Pagination};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use localhub_core::domain::{Conversation, Message};
use localhub_core::error::DomainError;
use localhub_core::repositories::ConversationRepository;

use super::support::{db_error, into_page};

const COLUMNS: &str = "id, workspace_id, subject, participant_ids, created_by, created_at, last_message_at";
const MESSAGE_COLUMNS: &str = "id, conversation_id, sender_id, body, created_at";

pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ConversationRow {
    id: Uuid,
    workspace_id: Uuid,
    subject: Option<String>,
    participant_ids: Vec<Uuid>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    last_message_at: Option<DateTime<Utc>>,
}

impl TryFrom<ConversationRow> for Conversation {
    type Error = DomainError;

    fn try_from(row: ConversationRow) -> Result<Self, Self::Error> {
        Ok(Conversation {
            id: row.id,
            workspace_id: row.workspace_id,
            subject: row.subject,
            participant_ids: row.participant_ids,
            created_by: row.created_by,
            created_at: row.created_at,
            last_message_at: row.last_message_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct MessageRow {
    id: Uuid,
    conversation_id: Uuid,
    sender_id: Uuid,
    body: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = DomainError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Message {
            id: row.id,
            conversation_id: row.conversation_id,
            sender_id: row.sender_id,
            body: row.body,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Conversation>, DomainError> {
        let row: Option<ConversationRow> = sqlx::query_as(&format!("SELECT {COLUMNS} FROM conversations WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("finding conversation by id"))?;

        row.map(Conversation::try_from).transpose()
    }

    async fn create_with_message(&self, conversation: &Conversation, message: &Message) -> Result<Conversation, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting conversation transaction"))?;

        let row: ConversationRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO conversations (id, workspace_id, subject, participant_ids, created_by, created_at, last_message_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(conversation.id)
        .bind(conversation.workspace_id)
        .bind(&conversation.subject)
        .bind(&conversation.participant_ids)
        .bind(conversation.created_by)
        .bind(conversation.created_at)
        .bind(message.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("creating conversation"))?;

        sqlx::query("INSERT INTO messages (id, conversation_id, sender_id, body, created_at) VALUES ($1, $2, $3, $4, $5)")
            .bind(message.id)
            .bind(conversation.id)
            .bind(message.sender_id)
            .bind(&message.body)
            .bind(message.created_at)
            .execute(&mut *tx)
            .await
            .map_err(db_error("storing opening message"))?;

        tx.commit().await.map_err(db_error("committing conversation"))?;

        row.try_into()
    }

    async fn list_for_user(&self, workspace_id: &Uuid, user_id: &Uuid, pagination: Pagination) -> Result<Page<Conversation>, DomainError> {
        let rows: Vec<ConversationRow> = sqlx::query_as(&format!(
            r#"
            SELECT {COLUMNS} FROM conversations
            WHERE workspace_id = $1 AND $2 = ANY(participant_ids)
            ORDER BY last_message_at DESC NULLS LAST, created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(workspace_id)
        .bind(user_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing conversations"))?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM conversations WHERE workspace_id = $1 AND $2 = ANY(participant_ids)",
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("counting conversations"))?;

        into_page(rows, pagination, total)
    }

    async fn add_message(&self, message: &Message) -> Result<Message, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting message transaction"))?;

        let row: MessageRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(message.id)
        .bind(message.conversation_id)
        .bind(message.sender_id)
        .bind(&message.body)
        .bind(message.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("storing message"))?;

        sqlx::query(
            "UPDATE conversations SET last_message_at = GREATEST(COALESCE(last_message_at, $2), $2) WHERE id = $1",
        )
        .bind(message.conversation_id)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error("touching conversation"))?;

        tx.commit().await.map_err(db_error("committing message"))?;

        row.try_into()
    }

    async fn list_messages(&self, conversation_id: &Uuid, pagination: Pagination) -> Result<Page<Message>, DomainError> {
        let rows: Vec<MessageRow> = sqlx::query_as(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE conversation_id = $1 \
             ORDER BY created_at DESC, id LIMIT $2 OFFSET $3"
        ))
        .bind(conversation_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing messages"))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = $1")
            .bind(conversation_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting messages"))?;

        into_page(rows, pagination, total)
    }
}
