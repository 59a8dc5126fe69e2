//! Error types for Corpora services
//!
//! Provides:
//! - Distinct error kinds for different failure modes
//! - HTTP status code mapping
//! - Structured error responses
//! - Retriability classification for the job worker

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    InvalidRequest,
    ResourceLimitExceeded,
    Conflict,
    Truncated,
    RemoteRejected,
    Transient,
    DatabaseError,
    ObjectStoreError,
    VectorStoreError,
    QueueError,
    SerializationError,
    ConfigurationError,
    InternalError,
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{resource_type} not found: {id}")]
    NotFound { resource_type: String, id: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Resource limit exceeded: {message}")]
    ResourceLimitExceeded { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// The model terminated the response before completion. Deterministic,
    /// never retried.
    #[error("Response truncated by the model: {message}")]
    Truncated { message: String },

    #[error("{service} rejected the request ({status}): {message}")]
    RemoteRejected {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Transient failure: {message}")]
    Transient { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Object store error: {message}")]
    ObjectStore { message: String },

    #[error("Vector store error: {message}")]
    VectorStore { message: String },

    #[error("Queue error: {message}")]
    Queue { message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration or template error. Never retried.
    #[error("Fatal: {message}")]
    Fatal { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Convenience constructor for not-found errors
    pub fn not_found(resource_type: impl Into<String>, id: impl std::fmt::Display) -> Self {
        AppError::NotFound {
            resource_type: resource_type.into(),
            id: id.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidRequest {
            message: message.into(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::InvalidRequest { .. } => ErrorCode::InvalidRequest,
            AppError::ResourceLimitExceeded { .. } => ErrorCode::ResourceLimitExceeded,
            AppError::Conflict { .. } => ErrorCode::Conflict,
            AppError::Truncated { .. } => ErrorCode::Truncated,
            AppError::RemoteRejected { .. } => ErrorCode::RemoteRejected,
            AppError::Transient { .. } => ErrorCode::Transient,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::ObjectStore { .. } => ErrorCode::ObjectStoreError,
            AppError::VectorStore { .. } => ErrorCode::VectorStoreError,
            AppError::Queue { .. } => ErrorCode::QueueError,
            AppError::HttpClient(_) => ErrorCode::Transient,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Fatal { .. } => ErrorCode::ConfigurationError,
            AppError::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error.
    ///
    /// NotFound maps to 404, InvalidRequest and ResourceLimitExceeded map to
    /// 400, everything else is a 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::InvalidRequest { .. } | AppError::ResourceLimitExceeded { .. } => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the job worker may retry an operation that failed with this
    /// error. Truncation is deterministic; configuration, validation, CAS
    /// and remote 4xx rejections do not heal on retry.
    pub fn is_retriable(&self) -> bool {
        match self {
            AppError::Transient { .. }
            | AppError::HttpClient(_)
            | AppError::Database(_)
            | AppError::ObjectStore { .. }
            | AppError::VectorStore { .. }
            | AppError::Queue { .. }
            | AppError::Internal { .. } => true,
            AppError::NotFound { .. }
            | AppError::InvalidRequest { .. }
            | AppError::ResourceLimitExceeded { .. }
            | AppError::Conflict { .. }
            | AppError::Truncated { .. }
            | AppError::RemoteRejected { .. }
            | AppError::Serialization(_)
            | AppError::Fatal { .. } => false,
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

/// Structured error response body: `{code, message, details?}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        if self.is_server_error() {
            tracing::error!(error = %message, code = ?code, status = status.as_u16(), "Server error");
        } else {
            tracing::warn!(error = %message, code = ?code, status = status.as_u16(), "Client error");
        }

        let body = ErrorBody {
            code,
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = AppError::not_found("resource", 42);
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = AppError::invalid("missing field");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = AppError::ResourceLimitExceeded {
            message: "too many resources".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        // Everything that is not NotFound/InvalidRequest/limit maps to 500.
        let err = AppError::Conflict {
            message: "status changed".into(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_retriability() {
        assert!(AppError::Transient {
            message: "connection reset".into()
        }
        .is_retriable());
        assert!(!AppError::Truncated {
            message: "cut off".into()
        }
        .is_retriable());
        assert!(!AppError::Fatal {
            message: "bad template".into()
        }
        .is_retriable());
        assert!(!AppError::Conflict {
            message: "taken".into()
        }
        .is_retriable());
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::ResourceLimitExceeded).unwrap();
        assert_eq!(json, "\"RESOURCE_LIMIT_EXCEEDED\"");
    }
}
