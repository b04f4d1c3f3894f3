//! Click analytics
//!
//! Visitor extraction, device/OS classification and geolocation on the write
//! path; grouped aggregation into reports on the read path.

pub mod aggregator;
pub mod device;
pub mod geoip;
pub mod ip_extractor;
pub mod recorder;

pub use aggregator::StatsAggregator;
pub use device::{classify, classify_device, classify_os, Classification};
pub use geoip::{GeoLookup, IpApiResolver};
pub use ip_extractor::{extract_client_ip, extract_visitor, VisitorInfo};
pub use recorder::ClickRecorder;

/// Location or device type that could not be determined
pub const UNKNOWN_LABEL: &str = "未知";

/// Location reported for loopback and private-network visitors
pub const LOCAL_LABEL: &str = "本地";

/// Referrer bucket for visits without an external referrer
pub const DIRECT_VISIT_LABEL: &str = "直接訪問";
