use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsReport {
    pub short_code: String,
    pub original_url: String,
    pub total_clicks: i64,
    pub created_at: DateTime<Utc>,
    pub device_stats: Vec<DeviceStat>,
    pub referrer_stats: Vec<ReferrerStat>,
    pub ip_stats: Vec<IpStat>,
    pub time_distribution: Vec<TimeDistributionStat>,
    pub device_type_stats: Vec<DeviceTypeStat>,
    pub location_stats: Vec<LocationStat>,
    pub os_stats: Vec<OsStat>,
}

/// Raw user agent count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStat {
    pub user_agent: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferrerStat {
    pub referrer: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpStat {
    pub ip_address: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeDistributionStat {
    /// Hour label in the display timezone, e.g. `2024-01-01 14:00`
    pub time: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTypeStat {
    pub device_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationStat {
    pub location: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsStat {
    pub os: String,
    pub count: i64,
}
