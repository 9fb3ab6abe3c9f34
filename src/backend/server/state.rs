/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * `AppState` is the central state container, holding:
 * - The messaging store (PostgreSQL, or in-memory when no database is
 *   configured)
 * - The session registry (the only in-memory shared mutable resource)
 * - The presence broadcaster and delivery router built on top of it
 *
 * # Thread Safety
 *
 * Every field is cheaply cloneable and safe for concurrent access: the
 * store is an `Arc<dyn MessagingStore>`, the registry locks internally,
 * and the router/broadcaster hold only clones of those.
 */

use axum::extract::FromRef;
use std::sync::Arc;

use crate::backend::messaging::store::SharedStore;
use crate::backend::realtime::delivery::DeliveryRouter;
use crate::backend::realtime::presence::PresenceBroadcaster;
use crate::backend::realtime::registry::SessionRegistry;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Durable conversation/message/notification store
    pub store: SharedStore,

    /// Registry of currently connected users
    pub registry: SessionRegistry,

    /// Broadcasts the online set on registry changes
    pub presence: PresenceBroadcaster,

    /// Routes outbound events to connected sessions
    pub delivery: Arc<DeliveryRouter>,
}

impl AppState {
    /// Wire up the realtime components around a store
    pub fn new(store: SharedStore) -> Self {
        let registry = SessionRegistry::new();
        let presence = PresenceBroadcaster::new(registry.clone());
        let delivery = Arc::new(DeliveryRouter::new(store.clone(), registry.clone()));
        Self {
            store,
            registry,
            presence,
            delivery,
        }
    }
}

/// Allow handlers to extract the store directly from `AppState`
impl FromRef<AppState> for SharedStore {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.store.clone()
    }
}

/// Allow handlers to extract the session registry directly
impl FromRef<AppState> for SessionRegistry {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry.clone()
    }
}

/// Allow handlers to extract the delivery router directly
impl FromRef<AppState> for Arc<DeliveryRouter> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.delivery.clone()
    }
}
