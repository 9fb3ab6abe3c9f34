/**
 * Server Initialization
 *
 * Assembly of the Axum application: store loading, realtime component
 * wiring, and route configuration.
 *
 * # Initialization Process
 *
 * 1. Load the messaging store (PostgreSQL, or in-memory fallback)
 * 2. Build the session registry, presence broadcaster, and delivery
 *    router around it
 * 3. Create and configure the router
 *
 * The session registry starts empty on every boot: presence is
 * ephemeral by design, so there is no state restoration step.
 */

use axum::Router;

use crate::backend::messaging::SharedStore;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::load_store;
use crate::backend::server::state::AppState;

/// Create and configure the Axum application
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
pub async fn create_app() -> Router<()> {
    tracing::info!("Initializing CultureBook realtime server");

    // Step 1: Load the store (durable when configured)
    let store = load_store().await;

    // Step 2: Wire the realtime components around it
    let app = create_app_with_store(store);

    tracing::info!("Router configured");

    app
}

/// Assemble the application around a specific store
///
/// Split out so tests can run the full HTTP surface over the
/// in-memory store.
pub fn create_app_with_store(store: SharedStore) -> Router<()> {
    let app_state = AppState::new(store);
    create_router(app_state)
}
