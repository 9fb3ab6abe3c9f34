/**
 * Session Registry
 *
 * In-memory mapping of user identity to the live connection handle.
 * This is the only shared mutable state in the realtime subsystem and
 * it is purely an ephemeral routing index: whether a message was
 * delivered is answered by the durable store, never by this map.
 *
 * # Invariants
 *
 * - At most one handle per user. A second connection from the same
 *   user replaces the first (last-connect-wins); the replaced handle
 *   is stale and its transport is left for the owning connection task
 *   to close.
 * - `unregister` of an absent user is a no-op, so out-of-order
 *   disconnect events are harmless.
 *
 * # Thread Safety
 *
 * All operations take a short-lived lock on the inner map and are safe
 * under concurrent connection lifecycles. Nothing here blocks or
 * suspends.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::shared::event::ServerEvent;

/// Handle to one live connection
///
/// Pushing an event enqueues it on the connection's outbox channel;
/// the connection's writer task drains the channel into the transport.
/// Pushing to a dead handle is silently ignored — the durable store is
/// the source of truth, the push is best-effort.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    connection_id: Uuid,
    username: String,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl SessionHandle {
    pub fn new(username: impl Into<String>, sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            username: username.into(),
            sender,
        }
    }

    /// Display name of the connected user
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Push an event to this connection
    pub fn push(&self, event: ServerEvent) {
        if self.sender.send(event).is_err() {
            // Receiver gone: the connection is tearing down.
            tracing::debug!("[Registry] Push to closed connection dropped");
        }
    }

    /// Whether two handles refer to the same connection
    pub fn is_same_connection(&self, other: &SessionHandle) -> bool {
        self.connection_id == other.connection_id
    }
}

/// Registry of currently connected users
///
/// Constructed once at startup and passed by reference to the
/// components that need it; never a global.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<Uuid, SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for a user, replacing any prior handle
    pub fn register(&self, user_id: Uuid, handle: SessionHandle) {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.insert(user_id, handle).is_some() {
            tracing::debug!("[Registry] Replaced existing session for {}", user_id);
        }
    }

    /// Remove a user's session; no-op if absent
    pub fn unregister(&self, user_id: Uuid) {
        self.sessions.lock().unwrap().remove(&user_id);
    }

    /// Look up the live handle for a user; absence means offline
    pub fn lookup(&self, user_id: Uuid) -> Option<SessionHandle> {
        self.sessions.lock().unwrap().get(&user_id).cloned()
    }

    /// All currently registered user IDs, sorted
    pub fn snapshot(&self) -> Vec<Uuid> {
        let mut users: Vec<Uuid> = self.sessions.lock().unwrap().keys().copied().collect();
        users.sort();
        users
    }

    /// Push an event to every registered session
    pub fn broadcast_all(&self, event: ServerEvent) {
        let handles: Vec<SessionHandle> =
            self.sessions.lock().unwrap().values().cloned().collect();
        for handle in handles {
            handle.push(event.clone());
        }
    }
}
