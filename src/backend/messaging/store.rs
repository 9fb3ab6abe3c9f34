//! Messaging Store Contract
//!
//! The only mutation surface over Conversation, Message, and
//! Notification state. The delivery router and the REST handlers go
//! through this trait; nothing else writes messaging state, which is
//! what keeps the data-model invariants enforceable in one place.
//!
//! Two implementations exist: `PgMessagingStore` (PostgreSQL, the
//! durable source of truth) and `MemoryMessagingStore` (tests, and the
//! degraded mode when no database is configured).

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::backend::error::MessagingError;
use crate::shared::messaging::{ChatMessage, Conversation, Notification, NotificationKind};

/// Shared handle to whichever store implementation the server runs on
pub type SharedStore = Arc<dyn MessagingStore>;

/// Durable conversation/message/notification operations
///
/// Implementations must guarantee:
/// - one conversation per unordered participant set, even under
///   concurrent `create_conversation` calls (insert-on-conflict
///   returns the winner's row);
/// - `append_message` rejects senders outside the participant set and
///   empty content;
/// - `list_messages` returns chronological order.
#[async_trait]
pub trait MessagingStore: Send + Sync {
    /// Find a conversation by exact participant-set match
    async fn find_by_participants(
        &self,
        participants: &[Uuid],
    ) -> Result<Option<Conversation>, MessagingError>;

    /// Create a conversation for a participant set
    ///
    /// If another creation for the same set won a race, the existing
    /// conversation is returned instead of a duplicate.
    async fn create_conversation(
        &self,
        participants: &[Uuid],
    ) -> Result<Conversation, MessagingError>;

    /// Fetch a conversation by ID
    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>, MessagingError>;

    /// List a user's conversations, most recently updated first, with
    /// the last message hydrated
    async fn list_conversations_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Conversation>, MessagingError>;

    /// Append a message to a conversation
    async fn append_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> Result<ChatMessage, MessagingError>;

    /// Point a conversation's last-message reference at a message and
    /// bump its `updated_at`
    async fn set_last_message(
        &self,
        conversation_id: Uuid,
        message_id: Uuid,
    ) -> Result<(), MessagingError>;

    /// List messages in a conversation, chronological
    async fn list_messages(
        &self,
        conversation_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ChatMessage>, MessagingError>;

    /// Record that a user read a message
    async fn mark_message_read(
        &self,
        message_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), MessagingError>;

    /// Persist a notification
    async fn create_notification(
        &self,
        recipient_id: Uuid,
        sender_id: Uuid,
        kind: NotificationKind,
        post_id: Option<Uuid>,
    ) -> Result<Notification, MessagingError>;

    /// List a user's notifications, newest first
    async fn list_notifications_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Notification>, MessagingError>;

    /// Mark a notification as read
    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), MessagingError>;
}
