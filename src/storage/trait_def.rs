use crate::models::{ClickEvent, ShortLink};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("short code already exists")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// `(label, count)` row produced by the grouped-count queries
pub type GroupCount = (String, i64);

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables and indexes)
    async fn init(&self) -> Result<()>;

    /// Insert a new short link.
    ///
    /// The unique constraint on `short_code` is authoritative: a concurrent
    /// insert of the same code yields `StorageError::Conflict`.
    async fn create_link(
        &self,
        id: &str,
        short_code: &str,
        original_url: &str,
        created_at: i64,
    ) -> StorageResult<ShortLink>;

    /// Get a short link by short code
    async fn get_link(&self, short_code: &str) -> Result<Option<ShortLink>>;

    /// Check whether a short code is already taken
    async fn exists(&self, short_code: &str) -> Result<bool>;

    /// Append a click event
    async fn insert_click(&self, click: &ClickEvent) -> Result<()>;

    async fn count_clicks(&self, url_id: &str) -> Result<i64>;

    /// Most frequent non-empty user agents
    async fn top_user_agents(&self, url_id: &str, limit: i64) -> Result<Vec<GroupCount>>;

    /// Most frequent referrers. Empty referrers and referrers containing
    /// `own_domain` are reported under `direct_label`.
    async fn top_referrers(
        &self,
        url_id: &str,
        own_domain: &str,
        direct_label: &str,
        limit: i64,
    ) -> Result<Vec<GroupCount>>;

    /// Most frequent non-empty client IPs
    async fn top_ips(&self, url_id: &str, limit: i64) -> Result<Vec<GroupCount>>;

    /// Click counts per hour, newest bucket first.
    ///
    /// Hours are aligned to the timezone `utc_offset_secs` east of UTC. Each
    /// row is `(bucket_start, count)` where `bucket_start` is the Unix
    /// timestamp of the start of that local hour.
    async fn hourly_buckets(
        &self,
        url_id: &str,
        utc_offset_secs: i64,
        limit: i64,
    ) -> Result<Vec<(i64, i64)>>;

    /// Counts per stored device type. Missing device types are reported as `""`.
    async fn device_type_counts(&self, url_id: &str) -> Result<Vec<GroupCount>>;

    /// User agents of the clicks stored without a device type
    async fn blank_device_user_agents(&self, url_id: &str) -> Result<Vec<String>>;

    /// Most frequent locations, ignoring empty and `unknown_label` rows
    async fn top_locations(
        &self,
        url_id: &str,
        unknown_label: &str,
        limit: i64,
    ) -> Result<Vec<GroupCount>>;

    /// Every non-empty user agent recorded for a link
    async fn user_agents(&self, url_id: &str) -> Result<Vec<String>>;

    /// Most recent clicks, newest first
    async fn recent_clicks(&self, url_id: &str, limit: i64) -> Result<Vec<ClickEvent>>;
}
