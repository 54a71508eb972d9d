//! Error types for tubeproxy
//!
//! This module provides error handling for the library, including:
//! - The main [`Error`] type returned by every public operation
//! - [`BackendError`], the failure cause of a fetch/extract backend
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use crate::types::{JobId, JobStatus};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for tubeproxy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tubeproxy
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "jobs.download_dir")
        key: Option<String>,
    },

    /// The submitted input was rejected before any work started
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unknown or expired job id
    #[error("job {id} not found")]
    NotFound {
        /// The id as supplied by the caller
        id: String,
    },

    /// The job exists but has no deliverable result
    #[error("result for job {id} unavailable: {reason}")]
    ResultUnavailable {
        /// The job whose result was requested
        id: JobId,
        /// Why the result cannot be delivered
        reason: UnavailableReason,
    },

    /// The operation is not valid for the job's current state
    #[error("cannot {operation} job {id} in state {current}")]
    InvalidState {
        /// The job the operation targeted
        id: JobId,
        /// The operation that was attempted (e.g., "cancel")
        operation: String,
        /// The state that prevents the operation
        current: JobStatus,
    },

    /// The fetch/extract backend failed
    #[error("backend failure: {0}")]
    Backend(#[from] BackendError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Shutdown in progress - not accepting new jobs
    #[error("shutdown in progress: not accepting new jobs")]
    ShuttingDown,

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Reason a job's result cannot be delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    /// The job has not reached a terminal state yet
    Pending(JobStatus),
    /// The job ended in the error state
    Failed(String),
    /// The job completed with a local file that no longer exists
    FileMissing,
}

impl std::fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnavailableReason::Pending(status) => write!(f, "job is still {status}"),
            UnavailableReason::Failed(detail) => write!(f, "job failed: {detail}"),
            UnavailableReason::FileMissing => write!(f, "file missing"),
        }
    }
}

impl UnavailableReason {
    /// Short machine-readable tag used in API error details
    pub fn tag(&self) -> &'static str {
        match self {
            UnavailableReason::Pending(_) => "pending",
            UnavailableReason::Failed(_) => "failed",
            UnavailableReason::FileMissing => "file_missing",
        }
    }
}

/// Errors raised by fetch/extract backends
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend does not implement this operation
    #[error("{backend} does not support {operation}")]
    Unsupported {
        /// Backend name
        backend: String,
        /// The operation that is not supported (e.g., "fetch")
        operation: String,
    },

    /// The backend call exceeded its time budget
    #[error("{backend} timed out after {}s", after.as_secs())]
    Timeout {
        /// Backend name
        backend: String,
        /// The time budget that was exceeded
        after: Duration,
    },

    /// The remote service answered with a non-success HTTP status
    #[error("{backend} returned HTTP {status}")]
    Http {
        /// Backend name
        backend: String,
        /// HTTP status code
        status: u16,
    },

    /// The request could not be sent or its body could not be read
    #[error("{backend} request failed: {message}")]
    Request {
        /// Backend name
        backend: String,
        /// Transport error description
        message: String,
    },

    /// The remote service or tool refused the URL
    #[error("{backend} rejected the request: {message}")]
    Rejected {
        /// Backend name
        backend: String,
        /// The service's own error text
        message: String,
    },

    /// The backend answered but produced nothing downloadable
    #[error("{backend} returned no downloadable asset")]
    NoAsset {
        /// Backend name
        backend: String,
    },

    /// An external process failed to start or exited unsuccessfully
    #[error("{backend} process failed: {message}")]
    Process {
        /// Backend name
        backend: String,
        /// Exit status or stderr summary
        message: String,
    },

    /// The backend's output could not be parsed
    #[error("{backend} returned unparseable output: {message}")]
    Parse {
        /// Backend name
        backend: String,
        /// Parser error description
        message: String,
    },

    /// The job was cancelled while the backend was running
    #[error("cancelled")]
    Cancelled,

    /// Every backend in a fallback chain failed
    #[error("all backends failed: {}", attempts.join("; "))]
    AllFailed {
        /// One entry per attempted backend, in order
        attempts: Vec<String>,
    },
}

impl BackendError {
    /// Whether a fallback chain should move on silently to the next backend
    pub fn is_unsupported(&self) -> bool {
        matches!(self, BackendError::Unsupported { .. })
    }
}

/// API error response format
///
/// Returned by every API endpoint when an operation fails.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "success": false,
///   "error": "job 0b7e... not found",
///   "code": "not_found",
///   "details": { "job_id": "0b7e..." }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Always false
    pub success: bool,

    /// Human-readable error message
    pub error: String,

    /// Machine-readable error code (e.g., "not_found", "invalid_input")
    pub code: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
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
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::InvalidInput(_) => 400,

            // 404 Not Found - unknown job, or nothing to hand out yet
            Error::NotFound { .. } => 404,
            Error::ResultUnavailable { .. } => 404,

            // 409 Conflict
            Error::InvalidState { .. } => 409,

            // 502 Bad Gateway - External service errors
            Error::Backend(_) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,

            // 500 Internal Server Error
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidInput(_) => "invalid_input",
            Error::NotFound { .. } => "not_found",
            Error::ResultUnavailable { .. } => "result_unavailable",
            Error::InvalidState { .. } => "invalid_state",
            Error::Backend(e) => match e {
                BackendError::Timeout { .. } => "backend_timeout",
                BackendError::Cancelled => "cancelled",
                _ => "backend_failure",
            },
            Error::ShuttingDown => "shutting_down",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::NotFound { id } => Some(serde_json::json!({ "job_id": id })),
            Error::ResultUnavailable { id, reason } => Some(serde_json::json!({
                "job_id": id,
                "reason": reason.tag(),
            })),
            Error::InvalidState {
                id,
                operation,
                current,
            } => Some(serde_json::json!({
                "job_id": id,
                "operation": operation,
                "current_state": current,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({ "key": key })),
            Error::Backend(BackendError::AllFailed { attempts }) => {
                Some(serde_json::json!({ "attempts": attempts }))
            }
            _ => None,
        };

        ApiError {
            success: false,
            error: message,
            code,
            details,
        }
    }
}
