//! Analytics API handlers

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::app::AppState;
use crate::error::AppResult;
use crate::models::{ClickListResponse, StatsReport};

/// Full analytics report for a short code
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Path(short_code): Path<String>,
) -> AppResult<Json<StatsReport>> {
    Ok(Json(state.stats.report(&short_code).await?))
}

/// Most recent clicks for a short code
pub async fn get_clicks(
    State(state): State<Arc<AppState>>,
    Path(short_code): Path<String>,
) -> AppResult<Json<ClickListResponse>> {
    Ok(Json(state.stats.click_list(&short_code).await?))
}
