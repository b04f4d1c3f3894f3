use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored visit to a short link's redirect endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClickEvent {
    pub id: String,
    pub url_id: String,
    pub clicked_at: i64,
    pub ip_address: String,
    pub user_agent: String,
    pub referrer: String,
    pub device_type: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickDetail {
    /// RFC 3339 timestamp in the display timezone
    pub clicked_at: String,
    pub ip_address: String,
    pub location: String,
    pub device_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickListResponse {
    pub short_code: String,
    pub clicks: Vec<ClickDetail>,
    pub total: usize,
}
