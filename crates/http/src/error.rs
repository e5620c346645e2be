//! Error handling for the shelf HTTP layer

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// Payload nested under `error.error` for request-body failures.
///
/// Schema failures carry a list of messages while the forbidden-field check
/// carries a single string; clients match on both shapes.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ErrorPayload {
    Messages(Vec<String>),
    Message(String),
}

/// Body of every error response, serialized under the top-level `error` key
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
    pub trace_id: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    /// Request body violated its schema; one message per violation
    #[error("validation error: {}", .errors.join("; "))]
    Validation { errors: Vec<String> },

    /// Request body contained a field that may not be supplied
    #[error("forbidden field: {message}")]
    ForbiddenField { message: String },

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error from schema violation messages
    pub fn validation(errors: Vec<String>) -> Self {
        Self::Validation { errors }
    }

    /// Create a forbidden-field error
    pub fn forbidden_field(message: impl Into<String>) -> Self {
        Self::ForbiddenField {
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. }
            | AppError::ForbiddenField { .. }
            | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::ForbiddenField { .. } => "forbidden_field",
            AppError::BadRequest { .. } => "bad_request",
            AppError::NotFound { .. } => "not_found",
            AppError::Conflict { .. } => "conflict",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Split into the human-readable message and the optional nested payload
    fn into_parts(self) -> (String, Option<ErrorPayload>) {
        match self {
            AppError::Validation { errors } => (
                "request body failed validation".to_string(),
                Some(ErrorPayload::Messages(errors)),
            ),
            AppError::ForbiddenField { message } => {
                (message.clone(), Some(ErrorPayload::Message(message)))
            }
            AppError::BadRequest { message }
            | AppError::NotFound { message }
            | AppError::Conflict { message } => (message, None),
            // Alternate formatting keeps the context chain.
            AppError::Internal(e) => (format!("{:#}", e), None),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let trace_id = Uuid::now_v7();
        let timestamp = OffsetDateTime::now_utc().to_string();
        let status = self.status();
        let code = self.code();

        if status.is_server_error() {
            tracing::error!(
                trace_id = %trace_id,
                error_code = code,
                status_code = status.as_u16(),
                error = %self,
                "request failed"
            );
        } else {
            tracing::warn!(
                trace_id = %trace_id,
                error_code = code,
                status_code = status.as_u16(),
                error = %self,
                "request rejected"
            );
        }

        let (message, error) = self.into_parts();

        // Internal details stay in the logs for release builds.
        let message = if cfg!(not(debug_assertions)) && status == StatusCode::INTERNAL_SERVER_ERROR
        {
            "An internal server error occurred".to_string()
        } else {
            message
        };

        let envelope = ErrorEnvelope {
            error: ErrorBody {
                status: status.as_u16(),
                code: code.to_string(),
                message,
                error,
                trace_id: trace_id.to_string(),
                timestamp,
            },
        };

        (status, Json(envelope)).into_response()
    }
}
