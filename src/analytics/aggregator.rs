//! Click aggregation into per-link reports
//!
//! The grouped counts come straight from storage. Two breakdowns are
//! finished in process: device types, where clicks stored without a device
//! type are reclassified from their user agent, and operating systems, which
//! are not stored at all and are derived from every recorded user agent.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::device::{classify_device, classify_os};
use super::{DIRECT_VISIT_LABEL, UNKNOWN_LABEL};
use crate::error::{AppError, AppResult};
use crate::models::{
    ClickDetail, ClickEvent, ClickListResponse, DeviceStat, DeviceTypeStat, IpStat, LocationStat,
    OsStat, ReferrerStat, ShortLink, StatsReport, TimeDistributionStat,
};
use crate::storage::{GroupCount, Storage};

/// Reports render timestamps in UTC+8
pub const DISPLAY_UTC_OFFSET_SECS: i32 = 8 * 3600;

const TOP_USER_AGENTS: i64 = 10;
const TOP_REFERRERS: i64 = 10;
const TOP_IPS: i64 = 20;
const RECENT_HOURS: i64 = 48;
const TOP_LOCATIONS: i64 = 20;
const CLICK_LIST_LIMIT: i64 = 1000;

pub struct StatsAggregator {
    storage: Arc<dyn Storage>,
    own_domain: String,
}

impl StatsAggregator {
    pub fn new(storage: Arc<dyn Storage>, own_domain: impl Into<String>) -> Self {
        Self {
            storage,
            own_domain: own_domain.into(),
        }
    }

    /// Build the full analytics report for a short code
    pub async fn report(&self, short_code: &str) -> AppResult<StatsReport> {
        let link = self.find_link(short_code).await?;
        let url_id = link.id.as_str();
        let storage = &self.storage;

        let (
            total_clicks,
            user_agents,
            referrers,
            ips,
            hours,
            device_types,
            blank_device_uas,
            locations,
            all_user_agents,
        ) = tokio::try_join!(
            storage.count_clicks(url_id),
            storage.top_user_agents(url_id, TOP_USER_AGENTS),
            storage.top_referrers(url_id, &self.own_domain, DIRECT_VISIT_LABEL, TOP_REFERRERS),
            storage.top_ips(url_id, TOP_IPS),
            storage.hourly_buckets(url_id, i64::from(DISPLAY_UTC_OFFSET_SECS), RECENT_HOURS),
            storage.device_type_counts(url_id),
            storage.blank_device_user_agents(url_id),
            storage.top_locations(url_id, UNKNOWN_LABEL, TOP_LOCATIONS),
            storage.user_agents(url_id),
        )?;

        debug!(
            short_code = %short_code,
            total_clicks,
            repaired = blank_device_uas.len(),
            "assembled stats report"
        );

        Ok(StatsReport {
            short_code: link.short_code.clone(),
            original_url: link.original_url.clone(),
            total_clicks,
            created_at: link.created_at_utc(),
            device_stats: user_agents
                .into_iter()
                .map(|(user_agent, count)| DeviceStat { user_agent, count })
                .collect(),
            referrer_stats: referrers
                .into_iter()
                .map(|(referrer, count)| ReferrerStat { referrer, count })
                .collect(),
            ip_stats: ips
                .into_iter()
                .map(|(ip_address, count)| IpStat { ip_address, count })
                .collect(),
            time_distribution: time_distribution(hours),
            device_type_stats: device_type_breakdown(device_types, &blank_device_uas)
                .into_iter()
                .map(|(device_type, count)| DeviceTypeStat { device_type, count })
                .collect(),
            location_stats: locations
                .into_iter()
                .map(|(location, count)| LocationStat { location, count })
                .collect(),
            os_stats: os_breakdown(&all_user_agents)
                .into_iter()
                .map(|(os, count)| OsStat { os, count })
                .collect(),
        })
    }

    /// Most recent clicks of a short code, newest first
    pub async fn click_list(&self, short_code: &str) -> AppResult<ClickListResponse> {
        let link = self.find_link(short_code).await?;
        let clicks: Vec<ClickDetail> = self
            .storage
            .recent_clicks(&link.id, CLICK_LIST_LIMIT)
            .await?
            .into_iter()
            .map(click_detail)
            .collect();

        Ok(ClickListResponse {
            short_code: link.short_code,
            total: clicks.len(),
            clicks,
        })
    }

    async fn find_link(&self, short_code: &str) -> AppResult<ShortLink> {
        self.storage
            .get_link(short_code)
            .await?
            .ok_or(AppError::NotFound)
    }
}

fn display_offset() -> FixedOffset {
    FixedOffset::east_opt(DISPLAY_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

fn to_display_time(timestamp: i64) -> DateTime<FixedOffset> {
    DateTime::from_timestamp(timestamp, 0)
        .unwrap_or_default()
        .with_timezone(&display_offset())
}

/// `YYYY-MM-DD HH:00` in the display timezone
pub fn format_hour(bucket_start: i64) -> String {
    to_display_time(bucket_start)
        .format("%Y-%m-%d %H:00")
        .to_string()
}

/// Storage returns the newest buckets first; reports list them oldest first.
fn time_distribution(mut newest_first: Vec<(i64, i64)>) -> Vec<TimeDistributionStat> {
    newest_first.reverse();
    newest_first
        .into_iter()
        .map(|(bucket, count)| TimeDistributionStat {
            time: format_hour(bucket),
            count,
        })
        .collect()
}

/// Merge stored device-type counts with reclassified blank rows.
///
/// Blank rows are first counted as unknown. Each one whose user agent is
/// present is then moved from the unknown bucket to the label its user agent
/// classifies to.
fn device_type_breakdown(stored: Vec<GroupCount>, blank_user_agents: &[String]) -> Vec<GroupCount> {
    let mut counts: HashMap<String, i64> = HashMap::new();
    for (label, count) in stored {
        let label = if label.is_empty() {
            UNKNOWN_LABEL.to_string()
        } else {
            label
        };
        *counts.entry(label).or_default() += count;
    }

    for user_agent in blank_user_agents.iter().filter(|ua| !ua.is_empty()) {
        let label = classify_device(user_agent);
        if label == UNKNOWN_LABEL {
            continue;
        }
        if let Some(unknown) = counts.get_mut(UNKNOWN_LABEL) {
            *unknown -= 1;
        }
        *counts.entry(label.to_string()).or_default() += 1;
    }

    ranked(counts)
}

fn os_breakdown(user_agents: &[String]) -> Vec<GroupCount> {
    let mut counts: HashMap<String, i64> = HashMap::new();
    for user_agent in user_agents {
        *counts.entry(classify_os(user_agent)).or_default() += 1;
    }
    ranked(counts)
}

/// Drop empty buckets, then order by count descending and label ascending
fn ranked(counts: HashMap<String, i64>) -> Vec<GroupCount> {
    let mut rows: Vec<GroupCount> = counts.into_iter().filter(|(_, count)| *count > 0).collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows
}

fn click_detail(click: ClickEvent) -> ClickDetail {
    ClickDetail {
        clicked_at: to_display_time(click.clicked_at).to_rfc3339(),
        ip_address: click.ip_address,
        location: click.location,
        device_type: if click.device_type.is_empty() {
            UNKNOWN_LABEL.to_string()
        } else {
            click.device_type
        },
    }
}
