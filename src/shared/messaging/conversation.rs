//! Conversation Data Structure
//!
//! Represents a conversation between two or more users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::ChatMessage;

/// Represents a conversation between users
///
/// The participant set is fixed at creation time. `last_message_id`
/// tracks the most recent message for conversation-list previews.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: Uuid,
    /// Participant user IDs (at least two)
    pub participants: Vec<Uuid>,
    /// ID of the most recent message, if any
    pub last_message_id: Option<Uuid>,
    /// The most recent message (hydrated for conversation lists)
    pub last_message: Option<ChatMessage>,
    /// When the conversation was created
    pub created_at: DateTime<Utc>,
    /// Updated whenever a new message lands
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new conversation
    pub fn new(participants: Vec<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            participants,
            last_message_id: None,
            last_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if user is a participant
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.contains(&user_id)
    }
}

/// Canonical key for a participant set: sorted UUIDs joined with ':'.
///
/// Two concurrent creations for the same unordered pair map to the same
/// key, which is what the store's uniqueness guarantee hangs off.
pub fn participants_key(participants: &[Uuid]) -> String {
    let mut ids: Vec<Uuid> = participants.to_vec();
    ids.sort();
    ids.dedup();
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(":")
}

/// Response for listing conversations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConversationsResponse {
    pub conversations: Vec<Conversation>,
}

/// Request to create (or fetch) a conversation with another user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    pub participant_id: Uuid,
}

/// Response after creating a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConversationResponse {
    pub success: bool,
    pub conversation: Option<Conversation>,
    pub error: Option<String>,
}
