/**
 * Server Configuration
 *
 * Loading of the optional PostgreSQL-backed store. Configuration comes
 * from environment variables with development-friendly defaults.
 *
 * # Error Handling
 *
 * Store configuration errors are logged but do not prevent server
 * startup: with no usable database the server falls back to the
 * in-memory store, so the real-time channel keeps working and message
 * history simply does not survive a restart.
 */

use sqlx::PgPool;
use std::sync::Arc;

use crate::backend::messaging::{MemoryMessagingStore, PgMessagingStore, SharedStore};

/// Load the messaging store
///
/// This function:
/// 1. Reads `DATABASE_URL` from environment
/// 2. Creates a PostgreSQL connection pool
/// 3. Runs database migrations
///
/// # Returns
///
/// The PostgreSQL store when a database is configured and reachable,
/// otherwise the in-memory fallback.
pub async fn load_store() -> SharedStore {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!("DATABASE_URL not set. Falling back to in-memory message store.");
            return Arc::new(MemoryMessagingStore::new());
        }
    };

    tracing::info!("Connecting to database...");

    let pool = match PgPool::connect(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Falling back to in-memory message store.");
            return Arc::new(MemoryMessagingStore::new());
        }
    };

    tracing::info!("Database connection pool created successfully");

    // Run migrations
    tracing::info!("Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(_) => {
            tracing::info!("Database migrations completed successfully");
        }
        Err(e) => {
            tracing::error!("Failed to run database migrations: {:?}", e);
            // Continue anyway - migrations might have already been run
            tracing::warn!("Continuing without migrations - database might not be up to date");
        }
    }

    Arc::new(PgMessagingStore::new(pool))
}

/// Resolve the port the server listens on
pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .unwrap_or(3000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_server_port_default() {
        std::env::remove_var("SERVER_PORT");
        assert_eq!(server_port(), 3000);
    }

    #[test]
    #[serial]
    fn test_server_port_from_env() {
        std::env::set_var("SERVER_PORT", "8080");
        assert_eq!(server_port(), 8080);
        std::env::remove_var("SERVER_PORT");
    }

    #[test]
    #[serial]
    fn test_server_port_invalid_falls_back() {
        std::env::set_var("SERVER_PORT", "not-a-port");
        assert_eq!(server_port(), 3000);
        std::env::remove_var("SERVER_PORT");
    }
}
