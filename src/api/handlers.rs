//! Route handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::api::models::{HealthResponse, ImageRequest};
use crate::error::{AppError, Result};
use crate::gateway::GenerationRequest;
use crate::AppState;

/// `POST /image`: generate an image and return it as PNG
pub async fn generate_image(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ImageRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(body) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let request = GenerationRequest::try_from(body)?;

    let result = state.request_queue.submit(request).await?;

    Ok(([(CONTENT_TYPE, result.content_type)], result.bytes))
}

/// `GET /health`: liveness plus queue occupancy
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        queue: state.request_queue.stats(),
    })
}
