use axum::{
    body::Body,
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

pub const RESPONSE_TIME_HEADER: &str = "x-response-time-ms";

/// Stamp redirects and preview pages with the milliseconds spent producing them.
/// Error answers go out unstamped.
pub async fn stamp_response_time(request: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let mut response = next.run(request).await;

    let status = response.status();
    if status == StatusCode::FOUND || status.is_success() {
        if let Ok(elapsed) = HeaderValue::from_str(&started.elapsed().as_millis().to_string()) {
            response.headers_mut().insert(RESPONSE_TIME_HEADER, elapsed);
        }
    }
    response
}
