use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::resumes::errors::ResumeError;
use crate::validation::ValidationErrors;
use crate::worker::WorkerError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Resume error: {0}")]
    Resume(#[from] ResumeError),

    #[error("Queue error: {0}")]
    Queue(#[from] WorkerError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        let unique_violation = e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if unique_violation {
            AppError::Conflict(e.to_string())
        } else {
            AppError::Database(e)
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<Value>) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Validation error".to_string(),
                serde_json::to_value(errors).ok(),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
                None,
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Access denied".to_string(),
                None,
            ),
            AppError::Conflict(msg) => {
                tracing::error!("Integrity error: {msg}");
                (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    "Data integrity error".to_string(),
                    None,
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    None,
                )
            }
            AppError::Resume(e) => match e {
                ResumeError::FileProcessing(msg) => (
                    StatusCode::BAD_REQUEST,
                    "FILE_PROCESSING_ERROR",
                    msg.clone(),
                    None,
                ),
                ResumeError::Parse(msg) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "RESUME_PARSE_ERROR",
                    msg.clone(),
                    None,
                ),
                ResumeError::Validation(msg) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "RESUME_VALIDATION_ERROR",
                    msg.clone(),
                    None,
                ),
                ResumeError::Resume(msg) => {
                    tracing::error!("Resume error: {msg}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "RESUME_ERROR",
                        "Failed to process resume".to_string(),
                        None,
                    )
                }
            },
            AppError::Queue(e) => {
                tracing::error!("Queue error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "QUEUE_ERROR",
                    "A background task could not be scheduled".to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, fields) = self.parts();

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(fields) = fields {
            error["fields"] = fields;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
