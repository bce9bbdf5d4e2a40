use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid job URL: {0}")]
    Format(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Error loading the job URL: {0}")]
    Fetch(String),

    #[error("Could not parse model output: {0}")]
    Parse(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code shown to the client.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Format(_) => "FORMAT_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Fetch(_) => "FETCH_ERROR",
            AppError::Parse(_) => "PARSE_ERROR",
            AppError::Model(_) => "MODEL_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Format(_) | AppError::Configuration(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Fetch(_) | AppError::Parse(_) | AppError::Model(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the user. Storage and internal details are never echoed.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Database(_) => "A vector store error occurred".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Parse(e) => AppError::Parse(e.to_string()),
            other => AppError::Model(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = self.public_message();

        match &self {
            AppError::Database(e) => tracing::error!("Database error: {e}"),
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
            other if status.is_server_error() => tracing::warn!("{code}: {other}"),
            _ => {}
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
