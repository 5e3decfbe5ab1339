//! Error types for newscast
//!
//! This module provides error handling for the library, including:
//! - Item lifecycle errors (unknown ids, illegal transitions, dedup collisions)
//! - Collaborator failures (feed fetches, summarization)
//! - HTTP status code mapping for the review API
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for newscast operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for newscast
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "schedule.display_seconds")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Item lifecycle error (not found, illegal transition, duplicate)
    #[error(transparent)]
    Item(#[from] ItemError),

    /// A source feed could not be fetched or parsed
    #[error("fetch error: {0}")]
    Fetch(String),

    /// The summarizer failed to produce a headline and summary
    #[error("summarize error: {0}")]
    Summarize(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Shutdown in progress - not accepting new work
    #[error("shutdown in progress: not accepting new work")]
    ShuttingDown,

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// External tool execution failed (broadcast command, etc.)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Item lifecycle errors raised by the item store and the review gate
#[derive(Debug, Error)]
pub enum ItemError {
    /// No item with this id exists
    #[error("item {id} not found")]
    NotFound {
        /// The item ID that was not found
        id: i64,
    },

    /// The item's current state does not allow the requested transition
    #[error("cannot move item {id} from {current_state} to {requested_state}")]
    InvalidTransition {
        /// The item ID
        id: i64,
        /// State the item was in when the transition was attempted
        current_state: String,
        /// State the caller asked for
        requested_state: String,
    },

    /// Operation not permitted in the item's current state
    #[error("cannot {operation} item {id} in state {current_state}")]
    InvalidState {
        /// The item ID
        id: i64,
        /// The operation that was attempted (e.g., "edit")
        operation: String,
        /// The current state that prevents the operation
        current_state: String,
    },

    /// Another live item already carries this dedup key
    #[error("duplicate item: dedup key {dedup_key} already present")]
    DuplicateKey {
        /// The colliding dedup key
        dedup_key: String,
    },
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
/// It follows a standard format with machine-readable error codes,
/// human-readable messages, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "invalid_transition",
///     "message": "cannot move item 12 from streamed to approved",
///     "details": {
///       "item_id": 12,
///       "current_state": "streamed",
///       "requested_state": "approved"
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "item_not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::Config { .. } => 400,

            // 404 Not Found
            Error::Item(ItemError::NotFound { .. }) => 404,

            // 409 Conflict - the item is not in a state that allows the command
            Error::Item(ItemError::InvalidTransition { .. }) => 409,
            Error::Item(ItemError::InvalidState { .. }) => 409,
            Error::Item(ItemError::DuplicateKey { .. }) => 409,

            // 500 Internal Server Error
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Serialization(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - upstream collaborators
            Error::Fetch(_) => 502,
            Error::Summarize(_) => 502,
            Error::Network(_) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
            Error::ExternalTool(_) => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::Item(e) => match e {
                ItemError::NotFound { .. } => "item_not_found",
                ItemError::InvalidTransition { .. } => "invalid_transition",
                ItemError::InvalidState { .. } => "invalid_state",
                ItemError::DuplicateKey { .. } => "duplicate_key",
            },
            Error::Fetch(_) => "fetch_error",
            Error::Summarize(_) => "summarize_error",
            Error::Io(_) => "io_error",
            Error::ShuttingDown => "shutting_down",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::ExternalTool(_) => "external_tool_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Item(ItemError::NotFound { id }) => Some(serde_json::json!({
                "item_id": id,
            })),
            Error::Item(ItemError::InvalidTransition {
                id,
                current_state,
                requested_state,
            }) => Some(serde_json::json!({
                "item_id": id,
                "current_state": current_state,
                "requested_state": requested_state,
            })),
            Error::Item(ItemError::InvalidState {
                id,
                operation,
                current_state,
            }) => Some(serde_json::json!({
                "item_id": id,
                "operation": operation,
                "current_state": current_state,
            })),
            Error::Item(ItemError::DuplicateKey { dedup_key }) => Some(serde_json::json!({
                "dedup_key": dedup_key,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
