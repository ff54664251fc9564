//! Error handling module for the farm visit backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const FETCH_FAILED: &str = "FETCH_FAILED";
    pub const DELETE_FAILED: &str = "DELETE_FAILED";
    pub const UPLOAD_FAILED: &str = "UPLOAD_FAILED";
    pub const SUBMIT_FAILED: &str = "SUBMIT_FAILED";
    pub const PRESENTATION_BLOCKED: &str = "PRESENTATION_BLOCKED";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
}

/// User-facing text for a failed login. Identical for unknown users and wrong secrets.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Session required
    Unauthorized(String),
    /// Login rejected
    InvalidCredentials,
    /// Resource not found
    NotFound(String),
    /// Validation error
    Validation(String),
    /// Loading records from the store failed
    FetchFailed(String),
    /// Deleting a record failed
    DeleteFailed(String),
    /// Storing an uploaded photo failed
    UploadFailed(String),
    /// Inserting a submitted visit failed
    SubmitFailed(String),
    /// No display surface for the export
    PresentationBlocked,
    /// Database error
    Database(String),
    /// Internal server error
    Internal(String),
    /// Bad request
    BadRequest(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::FetchFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::DeleteFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::UploadFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::SubmitFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::PresentationBlocked => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::InvalidCredentials => codes::INVALID_CREDENTIALS,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::FetchFailed(_) => codes::FETCH_FAILED,
            AppError::DeleteFailed(_) => codes::DELETE_FAILED,
            AppError::UploadFailed(_) => codes::UPLOAD_FAILED,
            AppError::SubmitFailed(_) => codes::SUBMIT_FAILED,
            AppError::PresentationBlocked => codes::PRESENTATION_BLOCKED,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
        }
    }

    /// Get the user-facing error message.
    pub fn message(&self) -> String {
        match self {
            AppError::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE.to_string(),
            AppError::PresentationBlocked => {
                "Please allow popups to download the PDF".to_string()
            }
            AppError::FetchFailed(_) => "Error loading entries. Please reload.".to_string(),
            AppError::DeleteFailed(_) => "Error deleting entry. Please try again.".to_string(),
            AppError::UploadFailed(_) => "Error uploading photo. Please try again.".to_string(),
            AppError::SubmitFailed(_) => "Error submitting form. Please try again.".to_string(),
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::Database(msg) => msg.clone(),
            AppError::Internal(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),
        }
    }

    /// Re-tag a store failure as the operation-specific error the user sees.
    ///
    /// Validation and not-found errors pass through unchanged.
    pub fn during(self, operation: Operation) -> Self {
        let detail = match self {
            AppError::Database(detail) | AppError::Internal(detail) => detail,
            other => return other,
        };
        match operation {
            Operation::Fetch => AppError::FetchFailed(detail),
            Operation::Delete => AppError::DeleteFailed(detail),
            Operation::Upload => AppError::UploadFailed(detail),
            Operation::Submit => AppError::SubmitFailed(detail),
        }
    }
}

/// User-initiated operations whose failures get their own error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Fetch,
    Delete,
    Upload,
    Submit,
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::FetchFailed(detail)
            | AppError::DeleteFailed(detail)
            | AppError::UploadFailed(detail)
            | AppError::SubmitFailed(detail) => {
                write!(f, "{}: {}", self.error_code(), detail)
            }
            _ => write!(f, "{}: {}", self.error_code(), self.message()),
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        tracing::error!("I/O error: {:?}", err);
        AppError::Internal(format!("I/O error: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
    pub revision_id: i64,
}

impl ErrorResponse {
    pub fn new(error: &AppError, revision_id: i64) -> Self {
        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
            },
            revision_id,
        }
    }
}

/// Wrapper type for errors that carry revision_id context.
pub struct AppErrorWithRevision {
    pub error: AppError,
    pub revision_id: i64,
}

impl IntoResponse for AppErrorWithRevision {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let body = ErrorResponse::new(&self.error, self.revision_id);
        (status, Json(body)).into_response()
    }
}
