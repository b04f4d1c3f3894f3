use axum::http::HeaderMap;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use super::code::{generate_short_code, is_valid_custom_code, normalize_url};
use crate::error::{AppError, AppResult};
use crate::models::{ShortLink, ShortenRequest, ShortenResponse};
use crate::site::public_base_url;
use crate::storage::{Storage, StorageError};

const FALLBACK_BASE_URL: &str = "http://localhost:8080";

pub struct ShortenService {
    storage: Arc<dyn Storage>,
    base_url: Option<String>,
    max_attempts: u32,
}

impl ShortenService {
    pub fn new(storage: Arc<dyn Storage>, base_url: Option<String>, max_attempts: u32) -> Self {
        Self {
            storage,
            base_url,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Create a short link and return its public short URL.
    ///
    /// `headers` are only consulted for the short URL's base when no base URL
    /// is configured.
    pub async fn shorten(
        &self,
        request: ShortenRequest,
        headers: &HeaderMap,
    ) -> AppResult<ShortenResponse> {
        let original_url = normalize_url(&request.url);
        if !is_valid_url(&original_url) {
            return Err(AppError::InvalidUrl);
        }

        let custom_code = request.custom_code.filter(|code| !code.is_empty());
        let link = match custom_code {
            Some(code) => self.create_with_custom_code(&code, &original_url).await?,
            None => self.create_with_generated_code(&original_url).await?,
        };

        info!(
            short_code = %link.short_code,
            original_url = %link.original_url,
            "created short link"
        );

        Ok(ShortenResponse {
            short_url: format!("{}/url/{}", self.base_url(headers), link.short_code),
            created_at: link.created_at_utc(),
            original_url: link.original_url,
            short_code: link.short_code,
        })
    }

    /// Base of the returned short URLs
    pub fn base_url(&self, headers: &HeaderMap) -> String {
        public_base_url(self.base_url.as_deref(), headers, "http")
            .unwrap_or_else(|| FALLBACK_BASE_URL.to_string())
    }

    async fn create_with_custom_code(&self, code: &str, original_url: &str) -> AppResult<ShortLink> {
        if !is_valid_custom_code(code) {
            return Err(AppError::InvalidCustomCode);
        }
        if self.storage.exists(code).await? {
            return Err(AppError::Conflict);
        }

        // A concurrent request may claim the code between the check and the insert;
        // the unique constraint turns that into a Conflict as well.
        Ok(self.insert(code, original_url).await?)
    }

    async fn create_with_generated_code(&self, original_url: &str) -> AppResult<ShortLink> {
        for attempt in 1..=self.max_attempts {
            let code = generate_short_code(original_url);

            if self.storage.exists(&code).await? {
                debug!(short_code = %code, attempt, "generated code already taken");
                continue;
            }

            match self.insert(&code, original_url).await {
                Ok(link) => return Ok(link),
                Err(StorageError::Conflict) => {
                    debug!(short_code = %code, attempt, "generated code claimed concurrently");
                }
                Err(StorageError::Other(e)) => return Err(AppError::Storage(e)),
            }
        }

        warn!(
            attempts = self.max_attempts,
            original_url = %original_url,
            "could not find a free short code"
        );
        Err(AppError::ExhaustedRetries(self.max_attempts))
    }

    async fn insert(&self, code: &str, original_url: &str) -> Result<ShortLink, StorageError> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now().timestamp();
        self.storage
            .create_link(&id, code, original_url, created_at)
            .await
    }
}

/// Absolute URL with both a scheme and a host
fn is_valid_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|url| !url.scheme().is_empty() && url.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false)
}
