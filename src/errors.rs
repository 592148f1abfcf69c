//! Unified error type for the service.
//!
//! Every layer (core logic, configuration, the HTTP API and the store client)
//! returns [`Error`]. The API layer maps each variant onto an HTTP status in
//! `api::error`.

use serde_json::Value;
use thiserror::Error;

/// Application error.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// A request body or parameter failed validation
    #[error("Validation failed: {message}")]
    Validation {
        /// Summary of the failure
        message: String,
        /// Per-field details, `{}` when there are none
        details: Value,
    },

    /// A verification status change outside PENDING -> APPROVED/REJECTED
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// Credentials did not match
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// What did not match
        message: String,
    },

    /// The addressed record does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. `"college"`
        entity: &'static str,
        /// The id that was looked up
        id: String,
    },

    /// A uniqueness rule was violated
    #[error("Conflict: {message}")]
    Conflict {
        /// Which rule
        message: String,
    },

    /// Password hashing or verification failed
    #[error("Password hashing error: {message}")]
    PasswordHash {
        /// Underlying hasher message
        message: String,
    },

    /// Outgoing email could not be delivered
    #[error("Email delivery error: {message}")]
    Email {
        /// Transport message
        message: String,
    },

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client error from the store client
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response received by the store client
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the server
        status: u16,
        /// Error message taken from the response body
        message: String,
    },
}

impl Error {
    /// Shorthand for a validation error without field details.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Shorthand for a missing record.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
