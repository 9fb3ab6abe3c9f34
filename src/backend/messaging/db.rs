//! PostgreSQL Messaging Store
//!
//! Durable implementation of `MessagingStore`. Conversations carry a
//! canonical `participants_key` (sorted participant UUIDs) with a
//! UNIQUE constraint; creation writes the conversation and participant
//! rows in one transaction with insert-on-conflict, then re-selects, so
//! two concurrent first messages between the same pair converge on one
//! conversation instead of racing lookup-then-create.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use uuid::Uuid;

use async_trait::async_trait;

use crate::backend::error::MessagingError;
use crate::backend::messaging::store::MessagingStore;
use crate::shared::messaging::{
    participants_key, ChatMessage, Conversation, Notification, NotificationKind, ReadReceipt,
};

/// PostgreSQL-backed messaging store
#[derive(Clone)]
pub struct PgMessagingStore {
    pool: PgPool,
}

impl PgMessagingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the participant set for a conversation
    async fn load_participants(&self, conversation_id: Uuid) -> Result<Vec<Uuid>, MessagingError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id FROM conversation_participants WHERE conversation_id = $1
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| r.get("user_id")).collect())
    }

    /// Load a single message by ID
    async fn load_message(&self, message_id: Uuid) -> Result<Option<ChatMessage>, MessagingError> {
        let row = sqlx::query(
            r#"
            SELECT id, conversation_id, sender_id, content, created_at
            FROM chat_messages
            WHERE id = $1
            "#,
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| ChatMessage {
            id: r.get("id"),
            conversation_id: r.get("conversation_id"),
            sender_id: r.get("sender_id"),
            content: r.get("content"),
            created_at: r.get("created_at"),
            read_by: Vec::new(),
        }))
    }

    /// Build a full `Conversation` from a base row
    async fn hydrate_conversation(
        &self,
        row: &sqlx::postgres::PgRow,
    ) -> Result<Conversation, MessagingError> {
        let id: Uuid = row.get("id");
        let last_message_id: Option<Uuid> = row.get("last_message_id");
        let created_at: DateTime<Utc> = row.get("created_at");
        let updated_at: DateTime<Utc> = row.get("updated_at");

        let participants = self.load_participants(id).await?;
        let last_message = match last_message_id {
            Some(message_id) => self.load_message(message_id).await?,
            None => None,
        };

        Ok(Conversation {
            id,
            participants,
            last_message_id,
            last_message,
            created_at,
            updated_at,
        })
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<Conversation>, MessagingError> {
        let row = sqlx::query(
            r#"
            SELECT id, last_message_id, created_at, updated_at
            FROM conversations
            WHERE participants_key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate_conversation(&row).await?)),
            None => Ok(None),
        }
    }

    /// Check if a user is a participant in a conversation
    async fn is_participant(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<bool, MessagingError> {
        let result = sqlx::query(
            r#"
            SELECT COUNT(*) as count
            FROM conversation_participants
            WHERE conversation_id = $1 AND user_id = $2
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let count: i64 = result.get("count");
        Ok(count > 0)
    }
}

#[async_trait]
impl MessagingStore for PgMessagingStore {
    async fn find_by_participants(
        &self,
        participants: &[Uuid],
    ) -> Result<Option<Conversation>, MessagingError> {
        self.find_by_key(&participants_key(participants)).await
    }

    async fn create_conversation(
        &self,
        participants: &[Uuid],
    ) -> Result<Conversation, MessagingError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let key = participants_key(participants);

        // Conversation and participant rows commit together: a losing
        // creator's re-select must never see one without the other.
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO conversations (id, participants_key, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (participants_key) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(&key)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // Only the insert winner writes the participant rows; a lost
        // race falls through to the re-select below.
        if result.rows_affected() == 1 {
            let mut ids: Vec<Uuid> = participants.to_vec();
            ids.sort();
            ids.dedup();
            for user_id in ids {
                sqlx::query(
                    r#"
                    INSERT INTO conversation_participants (conversation_id, user_id, joined_at)
                    VALUES ($1, $2, $3)
                    "#,
                )
                .bind(id)
                .bind(user_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        self.find_by_key(&key)
            .await?
            .ok_or_else(|| MessagingError::not_found("conversation"))
    }

    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>, MessagingError> {
        let row = sqlx::query(
            r#"
            SELECT id, last_message_id, created_at, updated_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate_conversation(&row).await?)),
            None => Ok(None),
        }
    }

    async fn list_conversations_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Conversation>, MessagingError> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.last_message_id, c.created_at, c.updated_at
            FROM conversations c
            INNER JOIN conversation_participants cp ON c.id = cp.conversation_id
            WHERE cp.user_id = $1
            ORDER BY c.updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut conversations = Vec::new();
        for row in rows {
            conversations.push(self.hydrate_conversation(&row).await?);
        }
        Ok(conversations)
    }

    async fn append_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> Result<ChatMessage, MessagingError> {
        if content.trim().is_empty() {
            return Err(MessagingError::invalid_input(
                "message content cannot be empty",
            ));
        }
        if !self.is_participant(sender_id, conversation_id).await? {
            return Err(MessagingError::forbidden(
                "sender is not a participant of this conversation",
            ));
        }

        let message = ChatMessage::new(conversation_id, sender_id, content);
        sqlx::query(
            r#"
            INSERT INTO chat_messages (id, conversation_id, sender_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(message.id)
        .bind(message.conversation_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;

        Ok(message)
    }

    async fn set_last_message(
        &self,
        conversation_id: Uuid,
        message_id: Uuid,
    ) -> Result<(), MessagingError> {
        sqlx::query(
            r#"
            UPDATE conversations SET last_message_id = $1, updated_at = $2 WHERE id = $3
            "#,
        )
        .bind(message_id)
        .bind(Utc::now())
        .bind(conversation_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_messages(
        &self,
        conversation_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ChatMessage>, MessagingError> {
        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, sender_id, content, created_at
            FROM chat_messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(conversation_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let mut messages: Vec<ChatMessage> = rows
            .into_iter()
            .map(|row| ChatMessage {
                id: row.get("id"),
                conversation_id: row.get("conversation_id"),
                sender_id: row.get("sender_id"),
                content: row.get("content"),
                created_at: row.get("created_at"),
                read_by: Vec::new(),
            })
            .collect();

        // Hydrate read receipts in one query
        let message_ids: Vec<Uuid> = messages.iter().map(|m| m.id).collect();
        let read_rows = sqlx::query(
            r#"
            SELECT message_id, user_id, read_at
            FROM message_reads
            WHERE message_id = ANY($1)
            "#,
        )
        .bind(&message_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut reads: HashMap<Uuid, Vec<ReadReceipt>> = HashMap::new();
        for row in read_rows {
            let message_id: Uuid = row.get("message_id");
            reads.entry(message_id).or_default().push(ReadReceipt {
                user_id: row.get("user_id"),
                read_at: row.get("read_at"),
            });
        }
        for message in &mut messages {
            if let Some(receipts) = reads.remove(&message.id) {
                message.read_by = receipts;
            }
        }

        Ok(messages)
    }

    async fn mark_message_read(
        &self,
        message_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), MessagingError> {
        sqlx::query(
            r#"
            INSERT INTO message_reads (message_id, user_id, read_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (message_id, user_id) DO NOTHING
            "#,
        )
        .bind(message_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_notification(
        &self,
        recipient_id: Uuid,
        sender_id: Uuid,
        kind: NotificationKind,
        post_id: Option<Uuid>,
    ) -> Result<Notification, MessagingError> {
        let notification = Notification::new(recipient_id, sender_id, kind, post_id);
        sqlx::query(
            r#"
            INSERT INTO notifications (id, recipient_id, sender_id, kind, post_id, read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(notification.id)
        .bind(notification.recipient_id)
        .bind(notification.sender_id)
        .bind(notification.kind.as_str())
        .bind(notification.post_id)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn list_notifications_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Notification>, MessagingError> {
        let rows = sqlx::query(
            r#"
            SELECT id, recipient_id, sender_id, kind, post_id, read, created_at
            FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Notification {
                id: row.get("id"),
                recipient_id: row.get("recipient_id"),
                sender_id: row.get("sender_id"),
                kind: NotificationKind::from_str(row.get::<String, _>("kind").as_str())
                    .unwrap_or(NotificationKind::Follow),
                post_id: row.get("post_id"),
                read: row.get("read"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), MessagingError> {
        sqlx::query(
            r#"
            UPDATE notifications SET read = TRUE WHERE id = $1 AND recipient_id = $2
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
