//! Typed errors and HTTP mapping.

use crate::response::{ApiResponse, ValidationErrorBody};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Message returned for any failure that is not part of the public taxonomy.
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred";

/// Message returned when an email collides with an existing student.
pub const DUPLICATE_EMAIL_MESSAGE: &str = "Email already exists";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Failures raised by a record store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store's unique constraint on email rejected the write.
    #[error("duplicate email: {0}")]
    DuplicateEmail(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

/// One field-level constraint violation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        FieldViolation {
            field,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    /// `path` is the request path, when known, reported as the body's description.
    #[error("validation failed on {} field(s)", .violations.len())]
    Validation {
        violations: Vec<FieldViolation>,
        path: Option<String>,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail(_) => AppError::Conflict(DUPLICATE_EMAIL_MESSAGE.into()),
            StoreError::Db(e) => AppError::Db(e),
        }
    }
}

impl AppError {
    pub fn validation(violations: Vec<FieldViolation>) -> Self {
        AppError::Validation { violations, path: None }
    }

    /// Attach the request path to a validation failure; other errors pass through.
    pub fn at_path(self, request_path: &str) -> Self {
        match self {
            AppError::Validation { violations, .. } => AppError::Validation {
                violations,
                path: Some(request_path.to_string()),
            },
            other => other,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::Validation { violations, path } => {
                tracing::debug!(count = violations.len(), "request rejected by validation");
                let body = ValidationErrorBody::new(status, &violations, path.as_deref());
                (status, Json(body)).into_response()
            }
            AppError::Db(e) => {
                tracing::error!(error = %e, "unexpected store failure");
                (status, Json(ApiResponse::<()>::error(status, UNEXPECTED_MESSAGE))).into_response()
            }
            other => {
                let message = other.to_string();
                tracing::debug!(status = status.as_u16(), message = %message, "request failed");
                (status, Json(ApiResponse::<()>::error(status, message))).into_response()
            }
        }
    }
}
