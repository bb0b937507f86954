//! Error types for ExamForge services
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling

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
    // Validation errors (1xxx)
    ValidationError,
    MissingField,

    // Caller context errors (2xxx)
    Unauthorized,

    // Lifecycle errors (3xxx)
    InvalidState,
    Conflict,

    // Resource errors (4xxx)
    PaperNotFound,
    HistoryEntryNotFound,

    // External collaborator errors (5xxx)
    GenerationError,
    RenderError,
    InsightError,

    // Internal errors (9xxx)
    ConfigurationError,
    InternalError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::ValidationError => 1001,
            ErrorCode::MissingField => 1002,

            // Caller context (2xxx)
            ErrorCode::Unauthorized => 2001,

            // Lifecycle (3xxx)
            ErrorCode::InvalidState => 3001,
            ErrorCode::Conflict => 3002,

            // Resources (4xxx)
            ErrorCode::PaperNotFound => 4001,
            ErrorCode::HistoryEntryNotFound => 4002,

            // External (5xxx)
            ErrorCode::GenerationError => 5001,
            ErrorCode::RenderError => 5002,
            ErrorCode::InsightError => 5003,

            // Internal (9xxx)
            ErrorCode::ConfigurationError => 9001,
            ErrorCode::InternalError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Required field missing: {field}")]
    MissingField { field: String },

    // Caller context errors
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    // Lifecycle errors
    #[error("Invalid paper state: {message}")]
    InvalidState { message: String },

    #[error("Conflicting mutation in flight for paper {id}")]
    Conflict { id: String },

    // Resource errors
    #[error("Paper not found: {id}")]
    PaperNotFound { id: String },

    #[error("History entry not found: {id}")]
    HistoryEntryNotFound { id: String },

    // External collaborator errors
    #[error("Generation service error: {message}")]
    Generation { message: String },

    #[error("Document renderer error: {message}")]
    Render { message: String },

    #[error("Insight generator error: {message}")]
    Insight { message: String },

    // Internal errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Convenience constructor for validation failures without a field
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Convenience constructor for lifecycle-state failures
    pub fn invalid_state(message: impl Into<String>) -> Self {
        AppError::InvalidState {
            message: message.into(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::MissingField { .. } => ErrorCode::MissingField,
            AppError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AppError::InvalidState { .. } => ErrorCode::InvalidState,
            AppError::Conflict { .. } => ErrorCode::Conflict,
            AppError::PaperNotFound { .. } => ErrorCode::PaperNotFound,
            AppError::HistoryEntryNotFound { .. } => ErrorCode::HistoryEntryNotFound,
            AppError::Generation { .. } => ErrorCode::GenerationError,
            AppError::Render { .. } => ErrorCode::RenderError,
            AppError::Insight { .. } => ErrorCode::InsightError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } |
            AppError::MissingField { .. } => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,

            // 404 Not Found
            AppError::PaperNotFound { .. } |
            AppError::HistoryEntryNotFound { .. } => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::InvalidState { .. } |
            AppError::Conflict { .. } => StatusCode::CONFLICT,

            // 502 Bad Gateway
            AppError::Generation { .. } |
            AppError::Render { .. } |
            AppError::Insight { .. } => StatusCode::BAD_GATEWAY,

            // 500 Internal Server Error
            AppError::Configuration { .. } |
            AppError::Internal { .. } |
            AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                details: None,
                request_id: None, // Should be filled by middleware
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::PaperNotFound { id: "test".into() };
        assert_eq!(err.code(), ErrorCode::PaperNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_error() {
        let err = AppError::Validation {
            message: "Ratios must sum to 100".into(),
            field: Some("provenance".into()),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
        assert!(err.is_client_error());
    }

    #[test]
    fn test_lifecycle_errors_map_to_conflict() {
        let state = AppError::invalid_state("paper is already approved");
        assert_eq!(state.status_code(), StatusCode::CONFLICT);
        assert_eq!(state.code(), ErrorCode::InvalidState);

        let conflict = AppError::Conflict { id: "abc".into() };
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(conflict.code(), ErrorCode::Conflict);
    }

    #[test]
    fn test_collaborator_errors_are_bad_gateway() {
        let err = AppError::Generation {
            message: "upstream timed out".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.code().as_code(), 5001);
    }
}
