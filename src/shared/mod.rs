//! Shared Module
//!
//! Types that cross the wire: the real-time event vocabulary and the
//! messaging data model. Everything here is serde-serializable and
//! consumed by both the real-time channel and the REST handlers.

/// Real-time event vocabulary
pub mod event;

/// Messaging data model
pub mod messaging;

/// Re-export commonly used types for convenience
pub use event::{ClientEvent, ServerEvent};
pub use messaging::{ChatMessage, Conversation, Notification, NotificationKind};
