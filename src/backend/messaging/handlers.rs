//! Messaging HTTP Handlers
//!
//! REST companions to the real-time channel: conversation listing,
//! fetch-or-create, message history, read receipts, and notifications.
//! They read and write the same store the delivery router uses, so
//! their results reflect real-time writes with no replication lag.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use uuid::Uuid;

use crate::backend::auth::tokens::verify_token;
use crate::backend::error::MessagingError;
use crate::backend::server::state::AppState;
use crate::shared::messaging::{
    CreateConversationRequest, CreateConversationResponse, CreateNotificationRequest,
    ListConversationsResponse, ListMessagesParams, ListMessagesResponse,
    ListNotificationsResponse, Notification,
};

/// Extract and verify the Bearer token from request headers
fn extract_user_id(headers: &HeaderMap) -> Result<Uuid, MessagingError> {
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| MessagingError::authentication("missing authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| MessagingError::authentication("malformed authorization header"))?;

    let claims = verify_token(token)
        .map_err(|e| MessagingError::authentication(format!("token verification failed: {}", e)))?;

    Uuid::parse_str(&claims.sub)
        .map_err(|e| MessagingError::authentication(format!("invalid subject in token: {}", e)))
}

/// List the caller's conversations (GET /api/conversations)
pub async fn get_conversations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListConversationsResponse>, MessagingError> {
    let user_id = extract_user_id(&headers)?;

    let conversations = state.store.list_conversations_for_user(user_id).await?;
    Ok(Json(ListConversationsResponse { conversations }))
}

/// Fetch or create a conversation with another user (POST /api/conversations)
///
/// Re-resolving by participant set is safe, so clients may retry this
/// freely; a second call returns the first call's conversation.
pub async fn create_conversation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateConversationRequest>,
) -> Result<Json<CreateConversationResponse>, MessagingError> {
    let user_id = extract_user_id(&headers)?;

    if request.participant_id == user_id {
        return Ok(Json(CreateConversationResponse {
            success: false,
            conversation: None,
            error: Some("cannot start a conversation with yourself".to_string()),
        }));
    }

    let participants = [user_id, request.participant_id];
    let conversation = match state.store.find_by_participants(&participants).await? {
        Some(conversation) => conversation,
        None => state.store.create_conversation(&participants).await?,
    };

    Ok(Json(CreateConversationResponse {
        success: true,
        conversation: Some(conversation),
        error: None,
    }))
}

/// List messages in a conversation (GET /api/conversations/{id}/messages)
pub async fn get_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(conversation_id): Path<Uuid>,
    Query(params): Query<ListMessagesParams>,
) -> Result<Json<ListMessagesResponse>, MessagingError> {
    let user_id = extract_user_id(&headers)?;

    let conversation = state
        .store
        .get_conversation(conversation_id)
        .await?
        .ok_or_else(|| MessagingError::not_found("conversation"))?;
    if !conversation.has_participant(user_id) {
        return Err(MessagingError::forbidden(
            "not a participant of this conversation",
        ));
    }

    let limit = params.limit.unwrap_or(50) as i64;
    let offset = params.offset.unwrap_or(0) as i64;

    let messages = state
        .store
        .list_messages(conversation_id, limit, offset)
        .await?;

    let has_more = messages.len() as i64 == limit;
    Ok(Json(ListMessagesResponse { messages, has_more }))
}

/// Record that the caller read a message (POST /api/messages/{id}/read)
pub async fn mark_message_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(message_id): Path<Uuid>,
) -> Result<StatusCode, MessagingError> {
    let user_id = extract_user_id(&headers)?;

    state.store.mark_message_read(message_id, user_id).await?;
    Ok(StatusCode::OK)
}

/// Create a notification and live-route it (POST /api/notifications)
///
/// Internal entry point for the resource handlers (likes, comments,
/// follows): the record is persisted first, then the live push is
/// attempted — an offline recipient only misses the toast.
pub async fn create_notification(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateNotificationRequest>,
) -> Result<Json<Notification>, MessagingError> {
    let sender_id = extract_user_id(&headers)?;

    let notification = state
        .store
        .create_notification(
            request.recipient_id,
            sender_id,
            request.kind,
            request.post_id,
        )
        .await?;

    state
        .delivery
        .route_notification(request.recipient_id, notification.clone());

    Ok(Json(notification))
}

/// List the caller's notifications (GET /api/notifications)
pub async fn get_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListNotificationsResponse>, MessagingError> {
    let user_id = extract_user_id(&headers)?;

    let notifications = state.store.list_notifications_for_user(user_id).await?;
    Ok(Json(ListNotificationsResponse { notifications }))
}

/// Mark a notification as read (POST /api/notifications/{id}/read)
pub async fn mark_notification_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(notification_id): Path<Uuid>,
) -> Result<StatusCode, MessagingError> {
    let user_id = extract_user_id(&headers)?;

    state
        .store
        .mark_notification_read(notification_id, user_id)
        .await?;
    Ok(StatusCode::OK)
}
