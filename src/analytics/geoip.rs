//! IP geolocation through an external HTTP API
//!
//! Lookups run inline with click recording, so every request is bounded by a
//! short timeout and every failure collapses to a sentinel label instead of
//! an error.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{LOCAL_LABEL, UNKNOWN_LABEL};
use crate::config::AnalyticsConfig;

/// Resolves an IP address to a human-readable location
#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// Never fails: private addresses map to the local label and lookup
    /// failures map to the unknown label.
    async fn resolve(&self, ip: &str) -> String;
}

/// Response body of the ip-api.com JSON endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiLocation {
    #[serde(default)]
    country: String,
    #[serde(default)]
    region_name: String,
    #[serde(default)]
    city: String,
}

/// Geo lookup backed by ip-api.com (or any endpoint with the same schema)
#[derive(Clone)]
pub struct IpApiResolver {
    client: Client,
    url_template: String,
}

impl IpApiResolver {
    /// Create a resolver from the analytics configuration
    ///
    /// `geoip_api_url` uses `{ip}` as the address placeholder.
    pub fn new(config: &AnalyticsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.geoip_timeout_ms))
            .build()
            .context("failed to build HTTP client for geo lookups")?;

        Ok(Self {
            client,
            url_template: config.geoip_api_url.clone(),
        })
    }

    async fn fetch(&self, ip: &str) -> Result<IpApiLocation> {
        let url = self.url_template.replace("{ip}", ip);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("geo lookup request for {ip} failed"))?;

        if response.status() != StatusCode::OK {
            anyhow::bail!("geo lookup for {ip} returned status {}", response.status());
        }

        response
            .json::<IpApiLocation>()
            .await
            .with_context(|| format!("geo lookup response for {ip} could not be parsed"))
    }
}

#[async_trait]
impl GeoLookup for IpApiResolver {
    async fn resolve(&self, ip: &str) -> String {
        if is_local_address(ip) {
            return LOCAL_LABEL.to_string();
        }

        match self.fetch(ip).await {
            Ok(location) => {
                let label = format_location(&location);
                debug!(ip = %ip, location = %label, "resolved visitor location");
                label
            }
            Err(err) => {
                warn!(ip = %ip, error = %err, "geo lookup failed");
                UNKNOWN_LABEL.to_string()
            }
        }
    }
}

/// Addresses that never leave the local network are not looked up.
///
/// The check is prefix based: every `172.*` address counts as private, not
/// only `172.16.0.0/12`.
pub fn is_local_address(ip: &str) -> bool {
    ip.is_empty()
        || ip == "::1"
        || ip == "localhost"
        || ["127.", "10.", "172.", "192.168."]
            .iter()
            .any(|prefix| ip.starts_with(prefix))
}

/// Join country, region and city, skipping empty parts and a region that
/// repeats the country.
fn format_location(location: &IpApiLocation) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(3);
    if !location.country.is_empty() {
        parts.push(&location.country);
    }
    if !location.region_name.is_empty() && location.region_name != location.country {
        parts.push(&location.region_name);
    }
    if !location.city.is_empty() {
        parts.push(&location.city);
    }

    if parts.is_empty() {
        UNKNOWN_LABEL.to_string()
    } else {
        parts.join(", ")
    }
}
