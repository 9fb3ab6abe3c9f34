//! Chat Message Data Structure
//!
//! Represents a message in a conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A read receipt attached to a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadReceipt {
    /// User who read the message
    pub user_id: Uuid,
    /// When the message was read
    pub read_at: DateTime<Utc>,
}

/// Represents a chat message
///
/// Messages are immutable once created; only the `read_by` set grows
/// as participants read them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// Unique message ID
    pub id: Uuid,
    /// Conversation this message belongs to
    pub conversation_id: Uuid,
    /// User who sent the message
    pub sender_id: Uuid,
    /// Message content (non-empty text)
    pub content: String,
    /// When the message was created
    pub created_at: DateTime<Utc>,
    /// Who has read this message, and when
    #[serde(default)]
    pub read_by: Vec<ReadReceipt>,
}

impl ChatMessage {
    /// Create a new message in a conversation
    pub fn new(conversation_id: Uuid, sender_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            content: content.into(),
            created_at: Utc::now(),
            read_by: Vec::new(),
        }
    }

    /// Whether the given user has read this message
    pub fn read_by_user(&self, user_id: Uuid) -> bool {
        self.read_by.iter().any(|r| r.user_id == user_id)
    }
}

/// Query parameters for listing messages in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMessagesParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Response for listing messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMessagesResponse {
    pub messages: Vec<ChatMessage>,
    pub has_more: bool,
}
