use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::models::BookingStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<FieldError>,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{message}")]
    Conflict {
        message: String,
        blocking_booking_ids: Vec<i64>,
    },

    #[error("cannot change booking status from {from} to {to}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },

    #[error("unauthorized")]
    Unauthorized,

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        AppError::Validation {
            details: vec![FieldError {
                field: field.to_string(),
                message: message.clone(),
            }],
            message,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict {
            message: message.into(),
            blocking_booking_ids: vec![],
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details = vec![];
        flatten_validation_errors(&errors, "", &mut details);
        details.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::Validation {
            message: "invalid data".to_string(),
            details,
        }
    }
}

fn flatten_validation_errors(errors: &ValidationErrors, prefix: &str, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    out.push(FieldError {
                        field: path.clone(),
                        message: err
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| err.code.to_string()),
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                flatten_validation_errors(nested, &path, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_validation_errors(nested, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation("body", rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "persistence failure");
                serde_json::json!({ "error": "internal error, please try again" })
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal failure");
                serde_json::json!({ "error": "internal error, please try again" })
            }
            AppError::Validation { message, details } => {
                serde_json::json!({ "error": message, "details": details })
            }
            AppError::Conflict {
                message,
                blocking_booking_ids,
            } if !blocking_booking_ids.is_empty() => {
                serde_json::json!({
                    "error": message,
                    "blockingBookingIds": blocking_booking_ids,
                })
            }
            AppError::InvalidTransition { from, to } => serde_json::json!({
                "error": self.to_string(),
                "currentStatus": from.as_str(),
                "requestedStatus": to.as_str(),
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };

        (status, axum::Json(body)).into_response()
    }
}
