use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::profile::generator::ProfileError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Profile(err) => profile_response(err),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

fn profile_response(err: &ProfileError) -> (StatusCode, &'static str, String) {
    match err {
        ProfileError::Llm(LlmError::MissingApiKey | LlmError::Authentication) => {
            tracing::error!("Configuration error: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
                err.to_string(),
            )
        }
        ProfileError::Llm(LlmError::Timeout { .. }) => {
            (StatusCode::BAD_REQUEST, "LLM_TIMEOUT", err.to_string())
        }
        ProfileError::Llm(llm_err) => {
            tracing::error!("Groq error: {llm_err}");
            (StatusCode::BAD_REQUEST, "PROVIDER_ERROR", err.to_string())
        }
        ProfileError::ParseExhausted { .. } => {
            (StatusCode::BAD_REQUEST, "GENERATION_FAILED", err.to_string())
        }
        ProfileError::InvalidSchema(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_SCHEMA",
            err.to_string(),
        ),
        ProfileError::SchemaIo { .. } => {
            tracing::error!("Schema error: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
                err.to_string(),
            )
        }
    }
}
