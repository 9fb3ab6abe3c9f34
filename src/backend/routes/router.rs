/**
 * Router Configuration
 *
 * Combines the real-time endpoint and the REST API into a single Axum
 * router.
 *
 * # Route Order
 *
 * 1. Real-time channel (`/ws`)
 * 2. API routes (conversations, messages, notifications)
 * 3. Fallback handler (404)
 */

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// # Arguments
///
/// * `app_state` - Application state containing the store and the
///   realtime components
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
pub fn create_router(app_state: AppState) -> Router<()> {
    // Real-time channel: token-gated WebSocket upgrade
    let router = Router::new().route(
        "/ws",
        axum::routing::get({
            use crate::backend::realtime::connection::handle_ws_upgrade;
            handle_ws_upgrade
        }),
    );

    // Add API routes
    let router = configure_api_routes(router);

    // Fallback handler for 404
    let router = router.fallback(|| async { "404 Not Found" });

    // Request tracing, then attach state
    router
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
