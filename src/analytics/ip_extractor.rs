//! Visitor extraction from HTTP headers
//!
//! Reverse proxies and CDNs in front of the service rewrite the standard
//! headers, so the client IP, user agent and referrer are read from a
//! prioritized list of proxy headers before falling back to the direct
//! connection.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// User agent recorded when the request carries none
pub const UNKNOWN_USER_AGENT: &str = "Unknown";

const IP_HEADERS: [&str; 3] = ["x-real-ip", "x-client-ip", "cf-connecting-ip"];
const USER_AGENT_HEADERS: [&str; 2] = ["x-forwarded-user-agent", "x-user-agent"];
const REFERER_HEADERS: [&str; 3] = ["x-forwarded-referer", "x-referer", "referer"];

/// Client details attached to a single redirect request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorInfo {
    pub ip: String,
    pub user_agent: String,
    /// Empty when the visit is direct or came from the service's own pages
    pub referrer: String,
}

/// Extract the visitor's IP, user agent and referrer
///
/// # Arguments
/// * `headers` - HTTP request headers
/// * `socket_addr` - The socket remote address (fallback for the IP)
/// * `own_domain` - The service's domain; referrers containing it are dropped
pub fn extract_visitor(headers: &HeaderMap, socket_addr: IpAddr, own_domain: &str) -> VisitorInfo {
    VisitorInfo {
        ip: extract_client_ip(headers, socket_addr),
        user_agent: extract_user_agent(headers),
        referrer: extract_referrer(headers, own_domain),
    }
}

/// Client IP from the first usable proxy header, else the socket address.
///
/// `X-Forwarded-For` may carry a chain; the leftmost entry is the client.
pub fn extract_client_ip(headers: &HeaderMap, socket_addr: IpAddr) -> String {
    if let Some(first) = header_str(headers, "x-forwarded-for")
        .and_then(|xff| xff.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return first.to_string();
    }

    IP_HEADERS
        .iter()
        .find_map(|name| non_empty_header(headers, name))
        .map(str::to_string)
        .unwrap_or_else(|| socket_addr.to_string())
}

pub fn extract_user_agent(headers: &HeaderMap) -> String {
    USER_AGENT_HEADERS
        .iter()
        .chain(std::iter::once(&"user-agent"))
        .find_map(|name| non_empty_header(headers, name))
        .unwrap_or(UNKNOWN_USER_AGENT)
        .to_string()
}

/// Referrer from the first non-empty referer header.
///
/// The first header present decides the outcome: a value pointing back at
/// the service is reported as a direct visit rather than falling through
/// to the next header.
pub fn extract_referrer(headers: &HeaderMap, own_domain: &str) -> String {
    match REFERER_HEADERS
        .iter()
        .find_map(|name| non_empty_header(headers, name))
    {
        Some(referrer) if !referrer.contains(own_domain) => referrer.to_string(),
        _ => String::new(),
    }
}

/// The raw `X-Forwarded-User-Agent` header, used for crawler detection
pub fn forwarded_user_agent(headers: &HeaderMap) -> Option<&str> {
    non_empty_header(headers, "x-forwarded-user-agent")
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}

fn non_empty_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    header_str(headers, name).filter(|v| !v.is_empty())
}
