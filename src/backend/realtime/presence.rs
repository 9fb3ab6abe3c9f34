/**
 * Presence Broadcasting
 *
 * Whenever the session registry changes, every connected session gets
 * the full current online-user set. This is a deliberate full-set
 * fan-out rather than a delta stream: any connected client always
 * holds the complete picture, and no presence history is kept.
 */

use crate::backend::realtime::registry::SessionRegistry;
use crate::shared::event::ServerEvent;

/// Broadcasts the online-user set on registry changes
#[derive(Clone)]
pub struct PresenceBroadcaster {
    registry: SessionRegistry,
}

impl PresenceBroadcaster {
    pub fn new(registry: SessionRegistry) -> Self {
        Self { registry }
    }

    /// Push the current online set to every connected session
    ///
    /// Called after every successful register and unregister. O(n) in
    /// connected clients per call.
    pub fn announce(&self) {
        let user_ids = self.registry.snapshot();
        tracing::debug!("[Presence] Announcing {} online users", user_ids.len());
        self.registry
            .broadcast_all(ServerEvent::online_users(user_ids));
    }
}
