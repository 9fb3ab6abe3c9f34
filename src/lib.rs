//! CultureBook Realtime - Main Library
//!
//! The real-time presence and messaging subsystem of the CultureBook
//! social network: it tracks which users are currently connected,
//! routes direct messages and live notifications to the right
//! session(s), and keeps the durable conversation history consistent
//! with what is broadcast live.
//!
//! # Overview
//!
//! - Authenticated WebSocket connections (`/ws`), one JSON event per
//!   frame
//! - A process-wide session registry with last-connect-wins semantics
//! - Store-and-forward message delivery: always durable, pushed live
//!   when the recipient is connected
//! - Full online-set presence broadcast on every connect/disconnect
//! - REST companion endpoints over the same store
//!
//! # Module Structure
//!
//! - **`shared`** - Wire types: the event vocabulary and the messaging
//!   data model
//! - **`backend`** - The Axum server: realtime subsystem, stores,
//!   REST handlers

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;
