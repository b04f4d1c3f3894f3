//! Public base URL of the service as seen by the client

use axum::http::{header, HeaderMap};

/// `BASE_URL` when configured, otherwise `{scheme}://{Host}` from the request.
///
/// The scheme comes from `X-Forwarded-Proto` when it names `http` or `https`
/// and is `default_scheme` otherwise. Returns `None` when neither a
/// configured base nor a `Host` header is available.
pub fn public_base_url(
    configured: Option<&str>,
    headers: &HeaderMap,
    default_scheme: &str,
) -> Option<String> {
    if let Some(base) = configured {
        return Some(base.to_string());
    }

    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())?;

    let scheme = match headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
    {
        Some(proto @ ("http" | "https")) => proto,
        _ => default_scheme,
    };

    Some(format!("{scheme}://{host}"))
}
