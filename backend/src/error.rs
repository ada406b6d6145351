//! Error handling for the Pharmacy Management Platform
//!
//! Every failure reaches the client as a typed JSON error with a stable code.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{AmountOutOfRange, Capability, InsufficientStock};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Missing capability: {0}")]
    Forbidden(Capability),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {message}")]
    Conflict { resource: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Ledger errors
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { available: i32, requested: i32 },

    #[error("Referential integrity violation: {0}")]
    ReferentialIntegrity(String),

    #[error("Transient storage error: {0}")]
    Transient(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Validation failure on a named input field
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Whether the caller may safely retry the same request
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Transient(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation { .. } | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. }
            | AppError::InsufficientStock { .. }
            | AppError::ReferentialIntegrity(_) => StatusCode::CONFLICT,
            AppError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> ErrorDetail {
        let (code, message, field, available) = match self {
            AppError::InvalidCredentials => (
                "INVALID_CREDENTIALS",
                "Invalid username or password".to_string(),
                None,
                None,
            ),
            AppError::Unauthorized(msg) => ("UNAUTHORIZED", msg.clone(), None, None),
            AppError::Forbidden(capability) => (
                "FORBIDDEN",
                format!("Permission denied: requires {}", capability),
                None,
                None,
            ),
            AppError::Validation { field, message } => {
                ("VALIDATION_ERROR", message.clone(), Some(field.clone()), None)
            }
            AppError::ValidationError(msg) => ("VALIDATION_ERROR", msg.clone(), None, None),
            AppError::Conflict { resource, message } => {
                ("CONFLICT", message.clone(), Some(resource.clone()), None)
            }
            AppError::NotFound(resource) => {
                ("NOT_FOUND", format!("{} not found", resource), None, None)
            }
            AppError::InsufficientStock {
                available,
                requested,
            } => (
                "INSUFFICIENT_STOCK",
                format!(
                    "Insufficient stock: requested {}, only {} available",
                    requested, available
                ),
                Some("quantity".to_string()),
                Some(*available),
            ),
            AppError::ReferentialIntegrity(msg) => (
                "REFERENTIAL_INTEGRITY_VIOLATION",
                msg.clone(),
                None,
                None,
            ),
            AppError::Transient(_) => (
                "TRANSIENT_ERROR",
                "The database is busy, please retry".to_string(),
                None,
                None,
            ),
            AppError::Database(_) => (
                "DATABASE_ERROR",
                "A database error occurred".to_string(),
                None,
                None,
            ),
            AppError::Internal(_) => (
                "INTERNAL_ERROR",
                "An internal server error occurred".to_string(),
                None,
                None,
            ),
        };

        ErrorDetail {
            code: code.to_string(),
            message,
            field,
            available,
            retryable: self.is_retryable(),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<i32>,
    pub retryable: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        (status, Json(ErrorResponse { error: self.detail() })).into_response()
    }
}

impl From<InsufficientStock> for AppError {
    fn from(err: InsufficientStock) -> Self {
        AppError::InsufficientStock {
            available: err.available,
            requested: err.requested,
        }
    }
}

impl From<AmountOutOfRange> for AppError {
    fn from(err: AmountOutOfRange) -> Self {
        AppError::validation("quantity", err.to_string())
    }
}

// Malformed request bodies, paths and query strings
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

// Postgres SQLSTATE codes that signal contention rather than a bad request
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const LOCK_NOT_AVAILABLE: &str = "55P03";
const QUERY_CANCELED: &str = "57014";
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::Transient(err.to_string())
            }
            sqlx::Error::RowNotFound => AppError::NotFound("Record".to_string()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some(SERIALIZATION_FAILURE)
                | Some(DEADLOCK_DETECTED)
                | Some(LOCK_NOT_AVAILABLE)
                | Some(QUERY_CANCELED) => AppError::Transient(db_err.message().to_string()),
                Some(UNIQUE_VIOLATION) => AppError::Conflict {
                    resource: db_err.constraint().unwrap_or("record").to_string(),
                    message: "A record with the same unique value already exists".to_string(),
                },
                Some(FOREIGN_KEY_VIOLATION) => {
                    AppError::ReferentialIntegrity(db_err.message().to_string())
                }
                Some(CHECK_VIOLATION) | Some(NUMERIC_VALUE_OUT_OF_RANGE) => {
                    AppError::ValidationError(db_err.message().to_string())
                }
                _ => AppError::Database(err),
            },
            _ => AppError::Database(err),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut fields: Vec<_> = field_errors.iter().collect();
        fields.sort_by_key(|(name, _)| **name);

        match fields.first() {
            Some((field, errs)) => {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("{} is invalid", field));
                AppError::validation(field, message)
            }
            None => AppError::ValidationError(errors.to_string()),
        }
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
