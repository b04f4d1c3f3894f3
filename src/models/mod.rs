mod click;
mod stats;
mod url;

pub use click::{ClickDetail, ClickEvent, ClickListResponse};
pub use stats::{
    DeviceStat, DeviceTypeStat, IpStat, LocationStat, OsStat, ReferrerStat, StatsReport,
    TimeDistributionStat,
};
pub use url::{ShortLink, ShortenRequest, ShortenResponse};
