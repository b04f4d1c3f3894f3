use axum::http::HeaderMap;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

use super::preview::{is_social_bot, render_preview_html, PreviewFetcher};
use crate::analytics::ip_extractor::{extract_visitor, forwarded_user_agent};
use crate::analytics::ClickRecorder;
use crate::error::{AppError, AppResult};
use crate::site::public_base_url;
use crate::storage::Storage;

/// What a short-link visit resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// HTML page with Open Graph tags, served to link-unfurling crawlers
    Preview(String),
    /// Original URL for a `302 Found`
    Redirect(String),
}

pub struct RedirectService {
    storage: Arc<dyn Storage>,
    recorder: ClickRecorder,
    fetcher: PreviewFetcher,
    base_url: Option<String>,
    site_domain: String,
}

impl RedirectService {
    pub fn new(
        storage: Arc<dyn Storage>,
        recorder: ClickRecorder,
        fetcher: PreviewFetcher,
        base_url: Option<String>,
        site_domain: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            recorder,
            fetcher,
            base_url,
            site_domain: site_domain.into(),
        }
    }

    /// Look up `short_code`, record the click and decide how to answer.
    ///
    /// Unknown codes record nothing. Click recording runs in the background
    /// and cannot fail the visit.
    pub async fn visit(
        &self,
        short_code: &str,
        headers: &HeaderMap,
        peer_ip: IpAddr,
    ) -> AppResult<RedirectOutcome> {
        if short_code.is_empty() {
            return Err(AppError::InvalidRequest("Short code is required".to_string()));
        }

        let link = self
            .storage
            .get_link(short_code)
            .await?
            .ok_or(AppError::NotFound)?;

        let visitor = extract_visitor(headers, peer_ip, &self.site_domain);
        let forwarded_ua = forwarded_user_agent(headers);
        let is_bot = is_social_bot(&visitor.user_agent, forwarded_ua);
        debug!(
            short_code = %short_code,
            user_agent = %visitor.user_agent,
            forwarded_user_agent = forwarded_ua.unwrap_or_default(),
            is_bot,
            "resolved short link"
        );

        self.recorder.record(&link.id, visitor);

        if !is_bot {
            return Ok(RedirectOutcome::Redirect(link.original_url));
        }

        let base_url = self.preview_base_url(headers);
        let short_url = format!("{base_url}/url/{}", link.short_code);
        let metadata = self.fetcher.fetch(&link.original_url).await;
        debug!(short_code = %short_code, base_url = %base_url, "serving crawler preview");

        Ok(RedirectOutcome::Preview(render_preview_html(
            &metadata,
            &short_url,
            &link.original_url,
            &base_url,
        )))
    }

    /// Base URL advertised to crawlers; assumes HTTPS unless told otherwise
    fn preview_base_url(&self, headers: &HeaderMap) -> String {
        public_base_url(self.base_url.as_deref(), headers, "https")
            .unwrap_or_else(|| format!("https://{}", self.site_domain))
    }
}
