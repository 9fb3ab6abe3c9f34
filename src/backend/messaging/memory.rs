//! In-memory Messaging Store
//!
//! Backs the server when no database is configured (history lives for
//! the process lifetime only) and the unit tests for the delivery
//! router. All maps sit behind one mutex, so the uniqueness guarantee
//! for participant sets falls out of the key-indexed lookup happening
//! under the same lock as the insert.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::backend::error::MessagingError;
use crate::backend::messaging::store::MessagingStore;
use crate::shared::messaging::{
    participants_key, ChatMessage, Conversation, Notification, NotificationKind, ReadReceipt,
};

#[derive(Default)]
struct Inner {
    conversations: HashMap<Uuid, Conversation>,
    by_key: HashMap<String, Uuid>,
    messages: HashMap<Uuid, Vec<ChatMessage>>,
    notifications: Vec<Notification>,
}

/// Process-memory implementation of `MessagingStore`
#[derive(Clone, Default)]
pub struct MemoryMessagingStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryMessagingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn hydrate_last_message(inner: &Inner, conversation: &Conversation) -> Conversation {
        let mut conversation = conversation.clone();
        if let Some(last_id) = conversation.last_message_id {
            conversation.last_message = inner
                .messages
                .get(&conversation.id)
                .and_then(|msgs| msgs.iter().find(|m| m.id == last_id).cloned());
        }
        conversation
    }
}

#[async_trait]
impl MessagingStore for MemoryMessagingStore {
    async fn find_by_participants(
        &self,
        participants: &[Uuid],
    ) -> Result<Option<Conversation>, MessagingError> {
        let inner = self.inner.lock().unwrap();
        let key = participants_key(participants);
        Ok(inner
            .by_key
            .get(&key)
            .and_then(|id| inner.conversations.get(id))
            .map(|c| Self::hydrate_last_message(&inner, c)))
    }

    async fn create_conversation(
        &self,
        participants: &[Uuid],
    ) -> Result<Conversation, MessagingError> {
        let mut inner = self.inner.lock().unwrap();
        let key = participants_key(participants);

        // A lost creation race returns the winner's conversation.
        if let Some(existing) = inner.by_key.get(&key).copied() {
            if let Some(conversation) = inner.conversations.get(&existing) {
                return Ok(Self::hydrate_last_message(&inner, conversation));
            }
        }

        let conversation = Conversation::new(participants.to_vec());
        inner.by_key.insert(key, conversation.id);
        inner.messages.insert(conversation.id, Vec::new());
        inner
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>, MessagingError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .conversations
            .get(&id)
            .map(|c| Self::hydrate_last_message(&inner, c)))
    }

    async fn list_conversations_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Conversation>, MessagingError> {
        let inner = self.inner.lock().unwrap();
        let mut conversations: Vec<Conversation> = inner
            .conversations
            .values()
            .filter(|c| c.has_participant(user_id))
            .map(|c| Self::hydrate_last_message(&inner, c))
            .collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
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

        let mut inner = self.inner.lock().unwrap();
        let conversation = inner
            .conversations
            .get(&conversation_id)
            .ok_or_else(|| MessagingError::not_found("conversation"))?;
        if !conversation.has_participant(sender_id) {
            return Err(MessagingError::forbidden(
                "sender is not a participant of this conversation",
            ));
        }

        let message = ChatMessage::new(conversation_id, sender_id, content);
        inner
            .messages
            .entry(conversation_id)
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn set_last_message(
        &self,
        conversation_id: Uuid,
        message_id: Uuid,
    ) -> Result<(), MessagingError> {
        let mut inner = self.inner.lock().unwrap();
        let conversation = inner
            .conversations
            .get_mut(&conversation_id)
            .ok_or_else(|| MessagingError::not_found("conversation"))?;
        conversation.last_message_id = Some(message_id);
        conversation.updated_at = Utc::now();
        Ok(())
    }

    async fn list_messages(
        &self,
        conversation_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ChatMessage>, MessagingError> {
        let inner = self.inner.lock().unwrap();
        let messages = inner
            .messages
            .get(&conversation_id)
            .ok_or_else(|| MessagingError::not_found("conversation"))?;
        Ok(messages
            .iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn mark_message_read(
        &self,
        message_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), MessagingError> {
        let mut inner = self.inner.lock().unwrap();
        for messages in inner.messages.values_mut() {
            if let Some(message) = messages.iter_mut().find(|m| m.id == message_id) {
                if !message.read_by_user(user_id) {
                    message.read_by.push(ReadReceipt {
                        user_id,
                        read_at: Utc::now(),
                    });
                }
                return Ok(());
            }
        }
        Err(MessagingError::not_found("message"))
    }

    async fn create_notification(
        &self,
        recipient_id: Uuid,
        sender_id: Uuid,
        kind: NotificationKind,
        post_id: Option<Uuid>,
    ) -> Result<Notification, MessagingError> {
        let mut inner = self.inner.lock().unwrap();
        let notification = Notification::new(recipient_id, sender_id, kind, post_id);
        inner.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list_notifications_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Notification>, MessagingError> {
        let inner = self.inner.lock().unwrap();
        let mut notifications: Vec<Notification> = inner
            .notifications
            .iter()
            .filter(|n| n.recipient_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), MessagingError> {
        let mut inner = self.inner.lock().unwrap();
        let notification = inner
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| MessagingError::not_found("notification"))?;
        if notification.recipient_id != user_id {
            return Err(MessagingError::forbidden(
                "notification belongs to another user",
            ));
        }
        notification.read = true;
        Ok(())
    }
}
