//! Error types for script-voice-relay
//!
//! This module provides error handling for the library, including:
//! - The pipeline error taxonomy (configuration, submission, lookup, timeout)
//! - HTTP status code mapping for the service boundary
//! - Structured error responses with machine-readable error codes
//!
//! Best-effort stages (history listing, artifact fetch, artifact publish) do
//! not appear here: they report failure through their return values instead.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for script-voice-relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for script-voice-relay
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is missing or invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key (usually the environment variable) that caused the error
        key: Option<String>,
    },

    /// The incoming request was rejected before any remote call
    #[error("validation error: {0}")]
    Validation(String),

    /// The agent service refused to create the job
    #[error("job submission rejected with status {status}: {body}")]
    Submission {
        /// HTTP status returned by the agent service
        status: u16,
        /// Response body returned alongside the status
        body: String,
    },

    /// Job detail could not be fetched or was malformed
    #[error("lookup of job {job_id} failed: {reason}")]
    Lookup {
        /// The job whose detail was requested
        job_id: String,
        /// Why the detail is unusable
        reason: String,
    },

    /// The job did not reach a terminal state before the deadline
    #[error("job {job_id} did not finish within {}s", .waited.as_secs())]
    Timeout {
        /// The job that was being waited on
        job_id: String,
        /// How long the waiter waited before giving up
        waited: Duration,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "config_error",
///     "message": "configuration error: BROWSER_USE_API_KEY is not set",
///     "details": {
///       "key": "BROWSER_USE_API_KEY"
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
    /// Machine-readable error code (e.g., "job_timeout", "validation_error")
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

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 422 Unprocessable Entity - request body is semantically invalid
            Error::Validation(_) => 422,

            // 500 Internal Server Error - server-side issues
            Error::Config { .. } => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,

            // 502 Bad Gateway - upstream service errors
            Error::Submission { .. } => 502,
            Error::Lookup { .. } => 502,
            Error::Network(_) => 502,

            // 504 Gateway Timeout - upstream job never finished
            Error::Timeout { .. } => 504,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(_) => "validation_error",
            Error::Submission { .. } => "submission_failed",
            Error::Lookup { .. } => "job_lookup_failed",
            Error::Timeout { .. } => "job_timeout",
            Error::Network(_) => "network_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::Submission { status, .. } => Some(serde_json::json!({
                "upstream_status": status,
            })),
            Error::Lookup { job_id, .. } => Some(serde_json::json!({
                "task_id": job_id,
            })),
            Error::Timeout { job_id, waited } => Some(serde_json::json!({
                "task_id": job_id,
                "waited_secs": waited.as_secs(),
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
