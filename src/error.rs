//! Structured error types for store operations and HTTP responses.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// Notice shown when a task is submitted with an empty field.
pub const ALL_FIELDS_REQUIRED: &str = "All fields are required. Please try again.";

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,

    // Internal errors
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    /// HTTP status used when the error is rendered directly.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::MissingRequiredField | ErrorCode::InvalidFieldValue => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Structured application error.
#[derive(Debug, Serialize)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    // Convenience constructors

    /// A required form field was empty. The message is the user-facing notice.
    pub fn missing_field(field: &str) -> Self {
        Self::new(ErrorCode::MissingRequiredField, ALL_FIELDS_REQUIRED).with_field(field)
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }

    /// True for errors the user can fix by resubmitting the form.
    pub fn is_validation(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::MissingRequiredField | ErrorCode::InvalidFieldValue
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(app_err) => app_err,
            Err(err) => match err.downcast::<rusqlite::Error>() {
                Ok(sql_err) => AppError::database(sql_err),
                Err(err) => AppError::internal(err),
            },
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        if status.is_server_error() {
            tracing::error!(code = ?self.code, "Request failed: {}", self.message);
        }
        let body = format!(
            "<!doctype html><html><head><title>Error</title></head><body>\
             <h1>{}</h1><p>{}</p><p><a href=\"/tasks\">Back to tasks</a></p></body></html>",
            status.canonical_reason().unwrap_or("Error"),
            crate::web::views::html_escape(&self.message)
        );
        (status, Html(body)).into_response()
    }
}

/// Result type for store and handler operations.
pub type AppResult<T> = std::result::Result<T, AppError>;
