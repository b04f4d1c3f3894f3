use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{ShortenRequest, ShortenResponse};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<&'static str>,
}

/// Create a new short URL
pub async fn shorten_url(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ShortenResponse>)> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected shorten request body");
        AppError::InvalidRequest("Invalid request body".to_string())
    })?;

    let response = state.shortener.shorten(request, &headers).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        message: "Short URL service is running",
    })
}

pub async fn service_info() -> impl IntoResponse {
    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            "GET /health",
            "POST /api/shorten",
            "GET /api/stats/{code}",
            "GET /api/clicks/{code}",
            "GET /{code}",
            "GET /url/{code}",
            "GET /shorturl/{code}",
        ],
    })
}
