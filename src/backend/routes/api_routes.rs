/**
 * API Route Handlers
 *
 * REST companion endpoints next to the real-time channel.
 *
 * # Routes
 *
 * ## Conversations & Messages
 * - `GET  /api/conversations` - List the caller's conversations
 * - `POST /api/conversations` - Fetch or create a conversation
 * - `GET  /api/conversations/{id}/messages` - Message history
 * - `POST /api/messages/{id}/read` - Record a read receipt
 *
 * ## Notifications
 * - `POST /api/notifications` - Persist + live-route a notification
 * - `GET  /api/notifications` - List the caller's notifications
 * - `POST /api/notifications/{id}/read` - Mark as read
 */

use axum::Router;

use crate::backend::messaging::handlers::{
    create_conversation, create_notification, get_conversations, get_messages,
    get_notifications, mark_message_read, mark_notification_read,
};
use crate::backend::server::state::AppState;

/// Configure API routes
///
/// # Arguments
///
/// * `router` - The router to add routes to
///
/// # Returns
///
/// Router with API routes configured
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/api/conversations",
            axum::routing::get(get_conversations).post(create_conversation),
        )
        .route(
            "/api/conversations/{id}/messages",
            axum::routing::get(get_messages),
        )
        .route(
            "/api/messages/{id}/read",
            axum::routing::post(mark_message_read),
        )
        .route(
            "/api/notifications",
            axum::routing::get(get_notifications).post(create_notification),
        )
        .route(
            "/api/notifications/{id}/read",
            axum::routing::post(mark_notification_read),
        )
}
