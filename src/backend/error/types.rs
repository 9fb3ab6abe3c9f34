/**
 * Backend Error Types
 *
 * This module defines the error taxonomy for the realtime messaging
 * subsystem. Each variant maps to an HTTP status code for the REST
 * surface; the real-time channel translates failures into targeted
 * `messageError` frames instead.
 *
 * # Error Categories
 *
 * - `Authentication` - a connection or request presented a missing or
 *   invalid credential; the connection is refused, nothing is retried
 *   server-side.
 * - `InvalidInput` - a send attempt with bad input (empty content,
 *   self-addressed message); the attempt is rejected, the connection
 *   stays open.
 * - `NotFound` / `Forbidden` - a lookup referenced a missing entity or
 *   one the caller is not a participant of.
 * - `Persistence` - the durable store rejected an operation; reported
 *   to the caller, never retried automatically.
 *
 * A recipient being offline is deliberately NOT an error: delivery is
 * store-and-forward and the durable record is authoritative.
 */

use axum::http::StatusCode;
use thiserror::Error;

/// Errors produced by the messaging core
#[derive(Debug, Error)]
pub enum MessagingError {
    /// Credential verification failed; no session is created
    #[error("Authentication failed: {reason}")]
    Authentication {
        /// Why the credential was rejected
        reason: String,
    },

    /// A send or request carried invalid input
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Human-readable error message
        message: String,
    },

    /// A referenced entity does not exist
    #[error("Not found: {what}")]
    NotFound {
        /// What was looked up
        what: String,
    },

    /// The caller is not allowed to touch the referenced entity
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Human-readable error message
        message: String,
    },

    /// The durable store is unreachable or rejected an operation
    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MessagingError {
    /// Create a new authentication error
    pub fn authentication(reason: impl Into<String>) -> Self {
        Self::Authentication {
            reason: reason.into(),
        }
    }

    /// Create a new invalid-input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a new forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `Authentication` - 401 Unauthorized
    /// - `InvalidInput` - 400 Bad Request
    /// - `NotFound` - 404 Not Found
    /// - `Forbidden` - 403 Forbidden
    /// - `Persistence` / `Serialization` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Authentication { .. } => StatusCode::UNAUTHORIZED,
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
