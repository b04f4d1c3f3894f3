use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;

use super::service::RedirectOutcome;
use crate::app::AppState;
use crate::error::AppResult;

/// Redirect a visitor, or serve the preview page to a crawler
pub async fn redirect_url(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let outcome = state.redirect.visit(&code, &headers, addr.ip()).await?;

    Ok(match outcome {
        RedirectOutcome::Preview(html) => Html(html).into_response(),
        RedirectOutcome::Redirect(target) => found(&target),
    })
}

/// `302 Found` to `target`.
///
/// Targets outside visible ASCII (raw non-ASCII paths) are sent in their
/// percent-encoded form. Anything `Url` cannot parse goes out as stored.
fn found(target: &str) -> Response {
    let location = if target.bytes().all(|b| b.is_ascii_graphic()) {
        target.to_string()
    } else {
        url::Url::parse(target)
            .map(String::from)
            .unwrap_or_else(|_| target.to_string())
    };

    match HeaderValue::from_str(&location) {
        Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
        Err(err) => {
            tracing::error!(target_url = %target, error = %err, "redirect target is not a valid Location");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
