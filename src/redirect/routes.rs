use axum::{middleware, routing::get, Router};
use std::sync::Arc;

use super::handlers::redirect_url;
use super::middleware::stamp_response_time;
use crate::app::AppState;

pub fn create_redirect_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/{code}", get(redirect_url))
        .route("/url/{code}", get(redirect_url))
        .route("/shorturl/{code}", get(redirect_url))
        .layer(middleware::from_fn(stamp_response_time))
        .with_state(state)
}
