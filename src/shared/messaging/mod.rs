//! Messaging Module
//!
//! Data structures for the messaging system:
//!
//! - `Conversation` - A conversation between users
//! - `ChatMessage` - A message in a conversation
//! - `Notification` - A notification delivered to a user

pub mod conversation;
pub mod message;
pub mod notification;

// Re-export all types
pub use conversation::{
    participants_key, Conversation, CreateConversationRequest, CreateConversationResponse,
    ListConversationsResponse,
};
pub use message::{ChatMessage, ListMessagesParams, ListMessagesResponse, ReadReceipt};
pub use notification::{
    CreateNotificationRequest, ListNotificationsResponse, Notification, NotificationKind,
};
