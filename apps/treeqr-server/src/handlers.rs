//! HTTP handlers for the TreeQR server

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::header::{CONTENT_LENGTH, CONTENT_TYPE},
    response::{Html, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::page;
use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "treeqr-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Handler: GET /:id
pub async fn tree_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let record = state.pipeline.resolve(&id).await?;
    debug!("Rendering page for {} ({})", id, record.name);
    Ok(Html(page::render(&id, &record)))
}

/// Handler: GET /generate-description/:id
pub async fn generate_description(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<String, ApiError> {
    info!("Description requested for {}", id);
    Ok(state.pipeline.describe(&id).await?)
}

#[derive(Debug, Deserialize)]
pub struct SpeakParams {
    #[serde(default)]
    pub text: Option<String>,
}

/// Handler: GET /speak?text=...
///
/// Relays the TTS response status, `Content-Type` and (when present)
/// `Content-Length`, and streams the audio body through without buffering it.
pub async fn speak(
    State(state): State<AppState>,
    Query(params): Query<SpeakParams>,
) -> Result<Response, ApiError> {
    let text = params.text.unwrap_or_default();
    let audio = state.pipeline.speak(&text).await?;

    let mut response = Response::builder().status(audio.status());
    if let Some(content_type) = audio.content_type() {
        response = response.header(CONTENT_TYPE, content_type.clone());
    }
    if let Some(length) = audio.content_length() {
        response = response.header(CONTENT_LENGTH, length.clone());
    }

    let body = Body::from_stream(audio.into_inner().bytes_stream());
    response
        .body(body)
        .map_err(|e| ApiError::Internal(format!("Failed to build audio response: {}", e)))
}
