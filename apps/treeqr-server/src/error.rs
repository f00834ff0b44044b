//! Error types for the TreeQR server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use treeqr_core::Error as PipelineError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Upstream causes are logged here and never echoed to the client
        let (status, message) = match &self {
            ApiError::Pipeline(PipelineError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "Tree not found".to_string())
            }
            ApiError::Pipeline(PipelineError::StoreUnavailable(cause)) => {
                tracing::error!("Record store unavailable: {}", cause);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Tree records are temporarily unavailable".to_string(),
                )
            }
            ApiError::Pipeline(PipelineError::GenerationFailed(cause)) => {
                tracing::error!("AI generation failed: {}", cause);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to generate description".to_string(),
                )
            }
            ApiError::Pipeline(PipelineError::BadRequest(msg)) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            ApiError::Pipeline(PipelineError::TtsUnavailable(cause)) => {
                tracing::error!("TTS unavailable: {}", cause);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to get TTS audio".to_string(),
                )
            }
            ApiError::Pipeline(PipelineError::Config(e)) => {
                tracing::error!("Configuration error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
