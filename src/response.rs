//! Standard response envelope helpers.

use crate::error::FieldViolation;
use axum::{http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Envelope for every non-validation response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    pub timestamp: DateTime<Utc>,
    pub status: u16,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        ApiResponse {
            success: status.is_success(),
            message: message.into(),
            data,
            timestamp: Utc::now(),
            status: status.as_u16(),
        }
    }

    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, message, None)
    }
}

/// Body for field validation failures: field name to violation message.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationErrorBody {
    pub status: u16,
    pub message: &'static str,
    pub description: String,
    pub validation_errors: BTreeMap<&'static str, String>,
    pub timestamp: DateTime<Utc>,
}

impl ValidationErrorBody {
    /// `description` is `uri=<path>` when the request path is known.
    pub fn new(status: StatusCode, violations: &[FieldViolation], path: Option<&str>) -> Self {
        let mut validation_errors = BTreeMap::new();
        for v in violations {
            validation_errors.entry(v.field).or_insert_with(|| v.message.clone());
        }
        ValidationErrorBody {
            status: status.as_u16(),
            message: "Validation failed",
            description: match path {
                Some(p) => format!("uri={}", p),
                None => format!("{} field(s) failed validation", validation_errors.len()),
            },
            validation_errors,
            timestamp: Utc::now(),
        }
    }
}

pub fn success_created<T: Serialize>(data: T, message: &str) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED, message, Some(data))),
    )
}

pub fn success_ok<T: Serialize>(data: T, message: &str) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::OK,
        Json(ApiResponse::new(StatusCode::OK, message, Some(data))),
    )
}

/// 200 with `data: null`, for operations with nothing to return.
pub fn success_message(message: &str) -> (StatusCode, Json<ApiResponse<()>>) {
    (StatusCode::OK, Json(ApiResponse::new(StatusCode::OK, message, None)))
}
