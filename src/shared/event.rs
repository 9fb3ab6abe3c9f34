//! Real-time Event Vocabulary
//!
//! This module defines the closed set of events exchanged over the
//! real-time channel, one JSON object per frame. Inbound frames parse
//! into `ClientEvent` and are dispatched by a single pattern match per
//! connection; outbound frames serialize from `ServerEvent`.
//!
//! The tags and payload fields use camelCase because they are the wire
//! contract with the JavaScript client (`onlineUsers`, `newMessage`,
//! `userTyping`, ...).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::messaging::{ChatMessage, Notification};

/// Events a client may send over the real-time channel
///
/// Anything that fails to parse into this enum is answered with a
/// `messageError` frame; the connection stays open.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Send a direct message to another user
    SendMessage { recipient_id: Uuid, content: String },
    /// The sender started typing in a conversation
    Typing { conversation_id: Uuid },
    /// The sender stopped typing in a conversation
    StopTyping { conversation_id: Uuid },
}

/// Events the server pushes to connected clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Full set of currently connected users; broadcast to everyone on
    /// any registry change
    OnlineUsers { user_ids: Vec<Uuid> },
    /// A new direct message, targeted at the recipient
    NewMessage { message: ChatMessage },
    /// A new notification, targeted at the recipient
    NewNotification { notification: Notification },
    /// Another participant started typing
    UserTyping { user_id: Uuid, name: String },
    /// Another participant stopped typing
    UserStopTyping { user_id: Uuid },
    /// A send attempt failed; targeted at the sender only
    MessageError { error: String },
}

impl ServerEvent {
    /// Create an online-users broadcast event
    pub fn online_users(user_ids: Vec<Uuid>) -> Self {
        Self::OnlineUsers { user_ids }
    }

    /// Create a new-message event
    pub fn new_message(message: ChatMessage) -> Self {
        Self::NewMessage { message }
    }

    /// Create a new-notification event
    pub fn new_notification(notification: Notification) -> Self {
        Self::NewNotification { notification }
    }

    /// Create a typing event for a conversation participant
    pub fn user_typing(user_id: Uuid, name: impl Into<String>) -> Self {
        Self::UserTyping {
            user_id,
            name: name.into(),
        }
    }

    /// Create a message-error event
    pub fn message_error(error: impl Into<String>) -> Self {
        Self::MessageError {
            error: error.into(),
        }
    }
}
