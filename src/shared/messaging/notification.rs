//! Notification Data Structure
//!
//! Notifications are created by resource handlers (likes, comments,
//! follows, group invites) and delivered live through the delivery
//! router when the recipient is connected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone liked a post
    Like,
    /// Someone commented on a post
    Comment,
    /// Someone started following the recipient
    Follow,
    /// Someone invited the recipient to a group
    GroupInvite,
}

impl NotificationKind {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Like => "like",
            NotificationKind::Comment => "comment",
            NotificationKind::Follow => "follow",
            NotificationKind::GroupInvite => "group_invite",
        }
    }

    /// Parse from string (database)
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "like" => Some(NotificationKind::Like),
            "comment" => Some(NotificationKind::Comment),
            "follow" => Some(NotificationKind::Follow),
            "group_invite" => Some(NotificationKind::GroupInvite),
            _ => None,
        }
    }
}

/// Represents a notification for a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    /// Unique notification ID
    pub id: Uuid,
    /// User this notification is for
    pub recipient_id: Uuid,
    /// User whose action triggered the notification
    pub sender_id: Uuid,
    /// What happened
    pub kind: NotificationKind,
    /// Post the notification refers to, if any
    pub post_id: Option<Uuid>,
    /// Whether the recipient has seen it
    pub read: bool,
    /// When the notification was created
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create a new unread notification
    pub fn new(
        recipient_id: Uuid,
        sender_id: Uuid,
        kind: NotificationKind,
        post_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient_id,
            sender_id,
            kind,
            post_id,
            read: false,
            created_at: Utc::now(),
        }
    }
}

/// Request to create a notification (internal, from resource handlers)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotificationRequest {
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub post_id: Option<Uuid>,
}

/// Response for listing notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListNotificationsResponse {
    pub notifications: Vec<Notification>,
}
