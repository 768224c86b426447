//! Error handling module for the FR generator backend.
//!
//! Provides the error taxonomy shared by the storage layer, the generators and the
//! orchestrator, with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const CONFLICT: &str = "CONFLICT";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const STORAGE_FAILURE: &str = "STORAGE_FAILURE";
    pub const TEMPLATE_MISSING: &str = "TEMPLATE_MISSING";
    pub const GENERATION_FAILURE: &str = "GENERATION_FAILURE";
    pub const FOLDER_CREATION_FAILURE: &str = "FOLDER_CREATION_FAILURE";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
}

/// Application error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Authentication required
    Unauthorized(String),
    /// Resource not found
    NotFound(String),
    /// Validation error on a stored record or an imported document
    Validation(String),
    /// Uniqueness conflict (e.g. duplicate category name)
    Conflict(String),
    /// Request record is missing mandatory basic fields
    InvalidRequest(String),
    /// Persistent store unreachable or corrupt
    StorageFailure(String),
    /// No template registered for the requested kind
    TemplateMissing(String),
    /// Parse or serialize error while producing a file
    GenerationFailure(String),
    /// Output folder could not be created
    FolderCreationFailure(String),
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
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::TemplateMissing(_) => StatusCode::NOT_FOUND,
            AppError::GenerationFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::FolderCreationFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Conflict(_) => codes::CONFLICT,
            AppError::InvalidRequest(_) => codes::INVALID_REQUEST,
            AppError::StorageFailure(_) => codes::STORAGE_FAILURE,
            AppError::TemplateMissing(_) => codes::TEMPLATE_MISSING,
            AppError::GenerationFailure(_) => codes::GENERATION_FAILURE,
            AppError::FolderCreationFailure(_) => codes::FOLDER_CREATION_FAILURE,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::Conflict(msg)
            | AppError::InvalidRequest(msg)
            | AppError::StorageFailure(msg)
            | AppError::TemplateMissing(msg)
            | AppError::GenerationFailure(msg)
            | AppError::FolderCreationFailure(msg)
            | AppError::Internal(msg)
            | AppError::BadRequest(msg) => msg.clone(),
        }
    }

    /// Wrap any displayable parse/serialize error as a generation failure.
    pub fn generation(context: &str, err: impl std::fmt::Display) -> Self {
        AppError::GenerationFailure(format!("{}: {}", context, err))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::StorageFailure(format!("Database error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::StorageFailure(format!("Corrupt record: {}", err))
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        AppError::generation("Invalid document package", err)
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
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorResponse::new(&self))).into_response()
    }
}
