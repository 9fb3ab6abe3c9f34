//! Authentication
//!
//! Verification of the identity service's JWT credentials. Issuance,
//! passwords, and user records live outside this subsystem.

pub mod tokens;

pub use tokens::{create_token, verify_token, Claims};
