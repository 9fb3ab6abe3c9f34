//! Backend Module
//!
//! Server-side code for the CultureBook realtime subsystem: the
//! WebSocket presence/messaging channel, the delivery router, the
//! durable store implementations, and the REST companion endpoints.
//!
//! # Architecture
//!
//! The backend is organized into focused submodules:
//!
//! - **`server`** - Server initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`realtime`** - Session registry, gate, presence, delivery, transport
//! - **`messaging`** - Store contract, PostgreSQL/in-memory stores, REST handlers
//! - **`auth`** - JWT credential verification
//! - **`error`** - Backend error types
//!
//! # State Management
//!
//! `AppState` holds the store and the realtime components. The session
//! registry is the only in-memory shared mutable resource and is only
//! reachable through its `register`/`unregister`/`lookup`/`snapshot`
//! operations; the durable store is the single source of truth for
//! message history.

/// Authentication and token verification
pub mod auth;

/// Backend error types
pub mod error;

/// Messaging stores and REST handlers
pub mod messaging;

/// Real-time presence and delivery
pub mod realtime;

/// Route configuration
pub mod routes;

/// Server setup and configuration
pub mod server;

/// Re-export commonly used types
pub use error::MessagingError;
pub use realtime::{DeliveryRouter, PresenceBroadcaster, SessionRegistry};
pub use server::{create_app, AppState};
