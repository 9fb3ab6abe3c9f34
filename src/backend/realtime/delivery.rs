/**
 * Delivery Router
 *
 * Given an outbound event — a direct message, a notification, a typing
 * signal — this component decides which connected session(s) receive a
 * live push. Delivery is store-and-forward: a direct message is always
 * persisted first, and the push to the recipient is best-effort. An
 * offline recipient is normal control flow, not an error; the durable
 * store is the authority on what exists, the registry only on who can
 * be reached right now.
 *
 * # Ordering
 *
 * For a single conversation, messages are persisted and pushed in call
 * order: each step of `route_direct_message` is awaited before the
 * push happens, and each connection's inbound events are handled
 * sequentially by its read loop. No ordering holds across
 * conversations.
 */

use std::sync::Arc;

use uuid::Uuid;

use crate::backend::error::MessagingError;
use crate::backend::messaging::store::MessagingStore;
use crate::backend::realtime::registry::SessionRegistry;
use crate::shared::event::ServerEvent;
use crate::shared::messaging::{ChatMessage, Notification};

/// Routes outbound events to connected sessions
#[derive(Clone)]
pub struct DeliveryRouter {
    store: Arc<dyn MessagingStore>,
    registry: SessionRegistry,
}

impl DeliveryRouter {
    pub fn new(store: Arc<dyn MessagingStore>, registry: SessionRegistry) -> Self {
        Self { store, registry }
    }

    /// Send a direct message from one user to another
    ///
    /// Resolves (or lazily creates) the conversation for the pair,
    /// persists the message, updates the conversation's last-message
    /// pointer, and pushes the message to the recipient's session if
    /// one is registered. The sender's own sessions get nothing — the
    /// client already holds optimistic local state.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for empty content or a self-addressed message;
    /// `Persistence` when the durable store rejects a write. Nothing is
    /// retried here: re-resolving by participant set is safe, so the
    /// client may simply resubmit.
    pub async fn route_direct_message(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        content: &str,
    ) -> Result<ChatMessage, MessagingError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(MessagingError::invalid_input(
                "message content cannot be empty",
            ));
        }
        if sender_id == recipient_id {
            return Err(MessagingError::invalid_input(
                "cannot send a message to yourself",
            ));
        }

        let participants = [sender_id, recipient_id];
        let conversation = match self.store.find_by_participants(&participants).await? {
            Some(conversation) => conversation,
            None => self.store.create_conversation(&participants).await?,
        };

        let message = self
            .store
            .append_message(conversation.id, sender_id, content)
            .await?;
        self.store
            .set_last_message(conversation.id, message.id)
            .await?;

        match self.registry.lookup(recipient_id) {
            Some(handle) => {
                handle.push(ServerEvent::new_message(message.clone()));
            }
            None => {
                // Offline recipient: the message is durable and will be
                // picked up on the next conversation fetch.
                tracing::debug!(
                    "[Delivery] Recipient {} offline, message {} stored only",
                    recipient_id,
                    message.id
                );
            }
        }

        Ok(message)
    }

    /// Push a notification to its recipient, if connected
    ///
    /// The notification record was already persisted by the caller;
    /// an offline recipient just misses the live toast.
    pub fn route_notification(&self, recipient_id: Uuid, notification: Notification) {
        match self.registry.lookup(recipient_id) {
            Some(handle) => handle.push(ServerEvent::new_notification(notification)),
            None => {
                tracing::debug!("[Delivery] Recipient {} offline, no live push", recipient_id);
            }
        }
    }

    /// Fan a typing signal out to the other participants of a conversation
    ///
    /// The display name on the typing event comes from the sender's
    /// registered session handle.
    ///
    /// # Errors
    ///
    /// `NotFound` when the conversation does not exist, `Forbidden`
    /// when the sender is not one of its participants.
    pub async fn route_typing(
        &self,
        sender_id: Uuid,
        conversation_id: Uuid,
        typing: bool,
    ) -> Result<(), MessagingError> {
        let conversation = self
            .store
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| MessagingError::not_found("conversation"))?;
        if !conversation.has_participant(sender_id) {
            return Err(MessagingError::forbidden(
                "not a participant of this conversation",
            ));
        }

        let event = if typing {
            let name = self
                .registry
                .lookup(sender_id)
                .map(|handle| handle.username().to_string())
                .unwrap_or_default();
            ServerEvent::user_typing(sender_id, name)
        } else {
            ServerEvent::UserStopTyping { user_id: sender_id }
        };

        for &participant in &conversation.participants {
            if participant == sender_id {
                continue;
            }
            if let Some(handle) = self.registry.lookup(participant) {
                handle.push(event.clone());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::messaging::memory::MemoryMessagingStore;
    use crate::backend::realtime::registry::SessionHandle;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    fn router() -> (DeliveryRouter, Arc<MemoryMessagingStore>, SessionRegistry) {
        let store = Arc::new(MemoryMessagingStore::new());
        let registry = SessionRegistry::new();
        let router = DeliveryRouter::new(store.clone(), registry.clone());
        (router, store, registry)
    }

    fn connect(
        registry: &SessionRegistry,
        user_id: Uuid,
        name: &str,
    ) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        registry.register(user_id, SessionHandle::new(name, tx));
        rx
    }

    #[tokio::test]
    async fn test_first_message_creates_conversation() {
        let (router, store, _registry) = router();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());

        let message = router
            .route_direct_message(u1, u2, "Bonjour")
            .await
            .unwrap();

        let conversation = store
            .find_by_participants(&[u1, u2])
            .await
            .unwrap()
            .expect("conversation should exist");
        assert!(conversation.has_participant(u1));
        assert!(conversation.has_participant(u2));
        assert_eq!(conversation.last_message_id, Some(message.id));
        assert_eq!(message.sender_id, u1);
        assert_eq!(message.content, "Bonjour");
    }

    #[tokio::test]
    async fn test_second_message_reuses_conversation() {
        let (router, store, _registry) = router();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());

        let first = router
            .route_direct_message(u1, u2, "Bonjour")
            .await
            .unwrap();
        let second = router
            .route_direct_message(u1, u2, "Ça va?")
            .await
            .unwrap();

        assert_eq!(first.conversation_id, second.conversation_id);

        let messages = store
            .list_messages(first.conversation_id, 50, 0)
            .await
            .unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["Bonjour", "Ça va?"]);
    }

    #[tokio::test]
    async fn test_created_at_monotonically_non_decreasing() {
        let (router, store, _registry) = router();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());

        for text in ["one", "two", "three"] {
            router.route_direct_message(u1, u2, text).await.unwrap();
        }

        let conversation = store
            .find_by_participants(&[u1, u2])
            .await
            .unwrap()
            .unwrap();
        let messages = store
            .list_messages(conversation.id, 50, 0)
            .await
            .unwrap();
        for pair in messages.windows(2) {
            assert!(pair[0].created_at <= pair[1].created_at);
        }
    }

    #[tokio::test]
    async fn test_online_recipient_receives_push() {
        let (router, _store, registry) = router();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let mut recipient_rx = connect(&registry, u2, "bob");

        let sent = router
            .route_direct_message(u1, u2, "Bonjour")
            .await
            .unwrap();

        match recipient_rx.recv().await.unwrap() {
            ServerEvent::NewMessage { message } => {
                assert_eq!(message.id, sent.id);
                assert_eq!(message.content, "Bonjour");
                assert_eq!(message.sender_id, u1);
            }
            other => panic!("Expected NewMessage, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_offline_recipient_still_persists() {
        let (router, store, registry) = router();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let mut recipient_rx = connect(&registry, u2, "bob");

        router
            .route_direct_message(u1, u2, "while online")
            .await
            .unwrap();
        recipient_rx.recv().await.unwrap();

        // Recipient disconnects; next send must not error and must persist
        registry.unregister(u2);
        router
            .route_direct_message(u1, u2, "while offline")
            .await
            .unwrap();

        let conversation = store
            .find_by_participants(&[u1, u2])
            .await
            .unwrap()
            .unwrap();
        let messages = store
            .list_messages(conversation.id, 50, 0)
            .await
            .unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["while online", "while offline"]);
        // Nothing more arrived on the stale channel
        assert!(recipient_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_sender_session_gets_no_push() {
        let (router, _store, registry) = router();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let mut sender_rx = connect(&registry, u1, "alice");

        router
            .route_direct_message(u1, u2, "Bonjour")
            .await
            .unwrap();

        assert!(sender_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_empty_content_is_rejected() {
        let (router, store, _registry) = router();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());

        let result = router.route_direct_message(u1, u2, "   ").await;
        assert_matches!(result, Err(MessagingError::InvalidInput { .. }));

        // No conversation was created for the failed attempt
        assert!(store
            .find_by_participants(&[u1, u2])
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_self_message_is_rejected() {
        let (router, _store, _registry) = router();
        let user = Uuid::new_v4();

        let result = router.route_direct_message(user, user, "hi me").await;
        assert_matches!(result, Err(MessagingError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_first_messages_share_conversation() {
        let (router, store, _registry) = router();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());

        let (a, b) = tokio::join!(
            router.route_direct_message(u1, u2, "from u1"),
            router.route_direct_message(u2, u1, "from u2"),
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.conversation_id, b.conversation_id);

        let conversation = store
            .find_by_participants(&[u1, u2])
            .await
            .unwrap()
            .unwrap();
        let messages = store
            .list_messages(conversation.id, 50, 0)
            .await
            .unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn test_notification_pushed_when_online() {
        let (router, _store, registry) = router();
        let (recipient, sender) = (Uuid::new_v4(), Uuid::new_v4());
        let mut rx = connect(&registry, recipient, "bob");

        let notification = Notification::new(
            recipient,
            sender,
            crate::shared::messaging::NotificationKind::Like,
            Some(Uuid::new_v4()),
        );
        router.route_notification(recipient, notification.clone());

        match rx.recv().await.unwrap() {
            ServerEvent::NewNotification { notification: got } => {
                assert_eq!(got, notification);
            }
            other => panic!("Expected NewNotification, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_notification_dropped_when_offline() {
        let (router, _store, _registry) = router();
        let notification = Notification::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            crate::shared::messaging::NotificationKind::Comment,
            None,
        );
        // Must not panic or error
        router.route_notification(notification.recipient_id, notification);
    }

    #[tokio::test]
    async fn test_typing_reaches_other_participant_only() {
        let (router, store, registry) = router();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let conversation = store.create_conversation(&[u1, u2]).await.unwrap();

        let mut alice_rx = connect(&registry, u1, "alice");
        let mut bob_rx = connect(&registry, u2, "bob");

        router
            .route_typing(u1, conversation.id, true)
            .await
            .unwrap();

        // The name comes from alice's registered handle
        match bob_rx.recv().await.unwrap() {
            ServerEvent::UserTyping { user_id, name } => {
                assert_eq!(user_id, u1);
                assert_eq!(name, "alice");
            }
            other => panic!("Expected UserTyping, got {:?}", other),
        }
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_typing_requires_participation() {
        let (router, store, _registry) = router();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let conversation = store.create_conversation(&[u1, u2]).await.unwrap();

        let result = router
            .route_typing(Uuid::new_v4(), conversation.id, true)
            .await;
        assert_matches!(result, Err(MessagingError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_typing_unknown_conversation() {
        let (router, _store, _registry) = router();
        let result = router
            .route_typing(Uuid::new_v4(), Uuid::new_v4(), false)
            .await;
        assert_matches!(result, Err(MessagingError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_stop_typing_event_shape() {
        let (router, store, registry) = router();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let conversation = store.create_conversation(&[u1, u2]).await.unwrap();
        let mut bob_rx = connect(&registry, u2, "bob");

        router
            .route_typing(u1, conversation.id, false)
            .await
            .unwrap();

        match bob_rx.recv().await.unwrap() {
            ServerEvent::UserStopTyping { user_id } => assert_eq!(user_id, u1),
            other => panic!("Expected UserStopTyping, got {:?}", other),
        }
    }
}
