use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::device::classify_device;
use super::geoip::GeoLookup;
use super::ip_extractor::VisitorInfo;
use crate::models::ClickEvent;
use crate::storage::Storage;

/// Records clicks in the background so redirects never wait on geo lookups
/// or click inserts.
#[derive(Clone)]
pub struct ClickRecorder {
    storage: Arc<dyn Storage>,
    geo: Arc<dyn GeoLookup>,
    debug: bool,
}

impl ClickRecorder {
    pub fn new(storage: Arc<dyn Storage>, geo: Arc<dyn GeoLookup>, debug: bool) -> Self {
        Self {
            storage,
            geo,
            debug,
        }
    }

    /// Spawn the click write for `url_id` and return immediately.
    ///
    /// Failures are logged and dropped. The handle is only useful to callers
    /// that need to wait for the write, such as tests.
    pub fn record(&self, url_id: &str, visitor: VisitorInfo) -> JoinHandle<()> {
        let recorder = self.clone();
        let url_id = url_id.to_string();
        tokio::spawn(async move {
            recorder.record_now(url_id, visitor).await;
        })
    }

    /// Classify, resolve and insert one click inline
    pub async fn record_now(&self, url_id: String, visitor: VisitorInfo) {
        let clicked_at = Utc::now().timestamp();
        let device_type = classify_device(&visitor.user_agent);
        let location = self.geo.resolve(&visitor.ip).await;

        let click = ClickEvent {
            id: Uuid::new_v4().to_string(),
            url_id,
            clicked_at,
            ip_address: visitor.ip,
            user_agent: visitor.user_agent,
            referrer: visitor.referrer,
            device_type: device_type.to_string(),
            location,
        };

        if self.debug {
            info!(
                url_id = %click.url_id,
                ip = %click.ip_address,
                user_agent = %click.user_agent,
                referrer = %click.referrer,
                device_type = %click.device_type,
                location = %click.location,
                "recording click"
            );
        }

        match self.storage.insert_click(&click).await {
            Ok(()) => debug!(url_id = %click.url_id, click_id = %click.id, "click recorded"),
            Err(e) => warn!(url_id = %click.url_id, error = %e, "failed to record click"),
        }
    }
}
