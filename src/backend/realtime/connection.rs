/**
 * Real-time Connection Handling
 *
 * One logical JSON event per WebSocket text frame. The gate verifies
 * the credential *before* the upgrade completes, so a refused
 * connection never creates any session state. After admission the
 * connection is registered, announced, and driven by a single read
 * loop dispatching the closed `ClientEvent` set.
 *
 * # Connection Lifecycle
 *
 * 1. `GET /ws?token=...` arrives; the gate verifies the token or the
 *    upgrade is refused with 401.
 * 2. A writer task drains the session's outbox channel into the
 *    socket sink.
 * 3. The session is registered (replacing any previous one for the
 *    same user) and presence is re-announced.
 * 4. Inbound frames are handled sequentially; failures answer the
 *    sender with a `messageError` frame and keep the connection open.
 * 5. On close, the registry entry is removed only if it still belongs
 *    to this connection, then presence is re-announced.
 */

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use tokio::sync::mpsc;

use crate::backend::realtime::gate::{self, AuthenticatedUser};
use crate::backend::realtime::registry::SessionHandle;
use crate::backend::server::state::AppState;
use crate::shared::event::{ClientEvent, ServerEvent};

/// Handle a real-time connection attempt (GET /ws)
///
/// The credential token travels in the `token` query parameter of the
/// upgrade request. Verification failures refuse the upgrade with 401
/// and a reason string; the client must reconnect with a fresh token.
pub async fn handle_ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let user = match gate::authenticate(params.get("token").map(String::as_str)) {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("[Gate] Connection refused: {}", e);
            return (StatusCode::UNAUTHORIZED, e.to_string()).into_response();
        }
    };

    ws.on_upgrade(move |socket| drive_connection(state, user, socket))
}

/// Drive an admitted connection until it closes
async fn drive_connection(state: AppState, user: AuthenticatedUser, socket: WebSocket) {
    tracing::info!(
        "[Realtime] User {} connected as '{}'",
        user.user_id,
        user.username
    );

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Writer task: outbox channel -> socket sink
    let writer = tokio::spawn(async move {
        while let Some(event) = outbox_rx.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("[Realtime] Failed to serialize event: {:?}", e);
                    continue;
                }
            };
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    let handle = SessionHandle::new(user.username.clone(), outbox_tx);
    state.registry.register(user.user_id, handle.clone());
    state.presence.announce();

    while let Some(Ok(frame)) = ws_receiver.next().await {
        match frame {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
                Ok(event) => dispatch_client_event(&state, &user, &handle, event).await,
                Err(e) => {
                    tracing::debug!(
                        "[Realtime] Unparseable frame from {}: {:?}",
                        user.user_id,
                        e
                    );
                    handle.push(ServerEvent::message_error("unrecognized event"));
                }
            },
            Message::Close(_) => break,
            // Pings are answered by axum; binary frames are not part
            // of the protocol.
            _ => {}
        }
    }

    // Only drop the registry entry if it is still ours: a newer
    // connection from the same user may already have replaced it, and
    // this late disconnect must not evict the live session.
    let still_ours = state
        .registry
        .lookup(user.user_id)
        .map(|current| current.is_same_connection(&handle))
        .unwrap_or(false);
    if still_ours {
        state.registry.unregister(user.user_id);
        state.presence.announce();
    }

    writer.abort();
    tracing::info!("[Realtime] User {} disconnected", user.user_id);
}

/// Dispatch one inbound client event
///
/// Send failures are answered with a targeted `messageError` frame;
/// nothing here tears down the connection or escapes to the transport
/// layer.
async fn dispatch_client_event(
    state: &AppState,
    user: &AuthenticatedUser,
    handle: &SessionHandle,
    event: ClientEvent,
) {
    match event {
        ClientEvent::SendMessage {
            recipient_id,
            content,
        } => {
            if let Err(e) = state
                .delivery
                .route_direct_message(user.user_id, recipient_id, &content)
                .await
            {
                tracing::warn!("[Delivery] Send from {} failed: {}", user.user_id, e);
                handle.push(ServerEvent::message_error(e.to_string()));
            }
        }
        ClientEvent::Typing { conversation_id } => {
            if let Err(e) = state
                .delivery
                .route_typing(user.user_id, conversation_id, true)
                .await
            {
                tracing::debug!("[Delivery] Typing signal rejected: {}", e);
            }
        }
        ClientEvent::StopTyping { conversation_id } => {
            if let Err(e) = state
                .delivery
                .route_typing(user.user_id, conversation_id, false)
                .await
            {
                tracing::debug!("[Delivery] Stop-typing signal rejected: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::messaging::memory::MemoryMessagingStore;
    use std::sync::Arc;
    use uuid::Uuid;

    fn test_state() -> AppState {
        AppState::new(Arc::new(MemoryMessagingStore::new()))
    }

    fn test_user(name: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: Uuid::new_v4(),
            username: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_failed_send_answers_sender_with_error() {
        let state = test_state();
        let alice = test_user("alice");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = SessionHandle::new("alice", tx);

        dispatch_client_event(
            &state,
            &alice,
            &handle,
            ClientEvent::SendMessage {
                recipient_id: Uuid::new_v4(),
                content: "   ".to_string(),
            },
        )
        .await;

        match rx.recv().await.unwrap() {
            ServerEvent::MessageError { error } => {
                assert!(error.contains("empty"));
            }
            other => panic!("Expected MessageError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_successful_send_pushes_nothing_to_sender() {
        let state = test_state();
        let alice = test_user("alice");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = SessionHandle::new("alice", tx);

        dispatch_client_event(
            &state,
            &alice,
            &handle,
            ClientEvent::SendMessage {
                recipient_id: Uuid::new_v4(),
                content: "Bonjour".to_string(),
            },
        )
        .await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_typing_for_unknown_conversation_is_swallowed() {
        let state = test_state();
        let alice = test_user("alice");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = SessionHandle::new("alice", tx);

        // Rejected signals are logged, not answered
        dispatch_client_event(
            &state,
            &alice,
            &handle,
            ClientEvent::Typing {
                conversation_id: Uuid::new_v4(),
            },
        )
        .await;

        assert!(rx.try_recv().is_err());
    }
}
