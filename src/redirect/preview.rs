//! Link previews for social-media crawlers
//!
//! Crawlers that unfurl links do not follow redirects to build their cards,
//! so they get a small HTML page carrying the target's Open Graph metadata
//! plus a client-side redirect.

use anyhow::{Context, Result};
use html_escape::decode_html_entities;
use regex::Regex;
use reqwest::{Client, StatusCode};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::PreviewConfig;

pub const DEFAULT_TITLE: &str = "短網址服務";
pub const DEFAULT_DESCRIPTION: &str = "點擊查看完整內容";
pub const DEFAULT_TYPE: &str = "website";

const BOT_MARKERS: [&str; 9] = [
    "facebookexternalhit",
    "facebot",
    "twitterbot",
    "linkedinbot",
    "whatsapp",
    "telegrambot",
    "slackbot",
    "discordbot",
    "discord",
];

fn meta_property(property: &str) -> Regex {
    Regex::new(&format!(
        r#"(?i)property=["']{property}["']\s+content=["']([^"']+)["']"#
    ))
    .expect("valid meta property pattern")
}

static OG_TITLE: LazyLock<Regex> = LazyLock::new(|| meta_property("og:title"));
static OG_DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| meta_property("og:description"));
static OG_IMAGE: LazyLock<Regex> = LazyLock::new(|| meta_property("og:image"));
static OG_TYPE: LazyLock<Regex> = LazyLock::new(|| meta_property("og:type"));
static OG_SITE_NAME: LazyLock<Regex> = LazyLock::new(|| meta_property("og:site_name"));
static TITLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<title>([^<]+)</title>").expect("valid title pattern"));
static META_DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)name=["']description["']\s+content=["']([^"']+)["']"#)
        .expect("valid description pattern")
});

/// True when either user agent belongs to a known link-unfurling crawler
pub fn is_social_bot(user_agent: &str, forwarded_user_agent: Option<&str>) -> bool {
    let matches = |ua: &str| {
        let ua = ua.to_lowercase();
        BOT_MARKERS.iter().any(|marker| ua.contains(marker))
    };
    matches(user_agent) || forwarded_user_agent.is_some_and(matches)
}

/// Open Graph metadata scraped from a target page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    /// Absolute image URL, if the page declares one
    pub image: Option<String>,
    pub og_type: String,
    pub site_name: Option<String>,
}

impl Default for PageMetadata {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            image: None,
            og_type: DEFAULT_TYPE.to_string(),
            site_name: None,
        }
    }
}

impl PageMetadata {
    /// Extract metadata from `html`, falling back to the defaults field by field.
    ///
    /// A relative `og:image` is resolved against `page_url`.
    pub fn from_html(html: &str, page_url: &str) -> Self {
        let mut metadata = PageMetadata::default();

        if let Some(title) = capture(&OG_TITLE, html).or_else(|| capture(&TITLE_TAG, html)) {
            metadata.title = title;
        }
        if let Some(description) =
            capture(&OG_DESCRIPTION, html).or_else(|| capture(&META_DESCRIPTION, html))
        {
            metadata.description = description;
        }
        if let Some(og_type) = capture(&OG_TYPE, html) {
            metadata.og_type = og_type;
        }
        metadata.site_name = capture(&OG_SITE_NAME, html);
        metadata.image = capture(&OG_IMAGE, html).map(|image| absolute_url(page_url, &image));

        metadata
    }
}

/// First capture group of `pattern`, with character references decoded.
///
/// Attribute and title text is entity-encoded in the source page and gets
/// escaped again when the preview is rendered.
fn capture(pattern: &Regex, html: &str) -> Option<String> {
    pattern
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_html_entities(m.as_str().trim()).into_owned())
        .filter(|value| !value.is_empty())
}

fn absolute_url(base: &str, reference: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(reference))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| reference.to_string())
}

/// Fetches target pages for preview metadata
#[derive(Clone)]
pub struct PreviewFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl PreviewFetcher {
    pub fn new(config: &PreviewConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.fetch_timeout_ms))
            .build()
            .context("failed to build HTTP client for link previews")?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Scrape `target_url`. Any failure yields the default metadata.
    pub async fn fetch(&self, target_url: &str) -> PageMetadata {
        match self.fetch_html(target_url).await {
            Ok(html) => {
                let metadata = PageMetadata::from_html(&html, target_url);
                debug!(target_url = %target_url, title = %metadata.title, "scraped preview metadata");
                metadata
            }
            Err(err) => {
                warn!(target_url = %target_url, error = %err, "failed to fetch preview metadata");
                PageMetadata::default()
            }
        }
    }

    async fn fetch_html(&self, target_url: &str) -> Result<String> {
        let mut response = self
            .client
            .get(target_url)
            .send()
            .await
            .context("preview request failed")?;

        if response.status() != StatusCode::OK {
            anyhow::bail!("preview request returned status {}", response.status());
        }

        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await.context("failed to read preview body")? {
            let remaining = self.max_body_bytes.saturating_sub(body.len());
            body.extend_from_slice(&chunk[..chunk.len().min(remaining)]);
            if body.len() >= self.max_body_bytes {
                break;
            }
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Render the crawler page for a short link.
///
/// `short_url` becomes `og:url`; `base_url` supplies the fallback image.
pub fn render_preview_html(
    metadata: &PageMetadata,
    short_url: &str,
    original_url: &str,
    base_url: &str,
) -> String {
    let image = metadata
        .image
        .clone()
        .unwrap_or_else(|| format!("{base_url}/og-image.png"));

    let og_type = escape_html(&metadata.og_type);
    let title = escape_html(&metadata.title);
    let description = escape_html(&metadata.description);
    let image = escape_html(&image);
    let short_url = escape_html(short_url);
    let target = escape_html(original_url);
    let site_name = metadata
        .site_name
        .as_deref()
        .map(|name| {
            format!(
                r#"<meta property="og:site_name" content="{}">"#,
                escape_html(name)
            )
        })
        .unwrap_or_default();
    let script_target = script_string(original_url);

    format!(
        r#"<!DOCTYPE html>
<html lang="zh-TW">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">

    <meta property="og:type" content="{og_type}">
    <meta property="og:url" content="{short_url}">
    <meta property="og:title" content="{title}">
    <meta property="og:description" content="{description}">
    <meta property="og:image" content="{image}">
    {site_name}

    <meta property="twitter:card" content="summary_large_image">
    <meta property="twitter:url" content="{short_url}">
    <meta property="twitter:title" content="{title}">
    <meta property="twitter:description" content="{description}">
    <meta property="twitter:image" content="{image}">

    <meta name="description" content="{description}">
    <title>{title}</title>

    <meta http-equiv="refresh" content="0;url={target}">
    <script>window.location.href={script_target};</script>
</head>
<body>
    <p>正在跳轉到 <a href="{target}">{target}</a>...</p>
</body>
</html>"#
    )
}

/// Escape text for use in HTML element content and quoted attributes
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// JavaScript string literal that cannot close the surrounding script element
fn script_string(s: &str) -> String {
    serde_json::to_string(s)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
}
