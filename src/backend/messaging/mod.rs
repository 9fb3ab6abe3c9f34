//! Messaging Backend
//!
//! The store contract, its PostgreSQL and in-memory implementations,
//! and the REST handlers that sit next to the real-time channel.

pub mod db;
pub mod handlers;
pub mod memory;
pub mod store;

pub use db::PgMessagingStore;
pub use memory::MemoryMessagingStore;
pub use store::{MessagingStore, SharedStore};
