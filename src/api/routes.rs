use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

use super::analytics::{get_clicks, get_stats};
use super::handlers::{health_check, service_info, shorten_url};

pub fn create_api_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/shorten", post(shorten_url))
        .route("/stats/{code}", get(get_stats))
        .route("/clicks/{code}", get(get_clicks));

    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .with_state(state)
}
