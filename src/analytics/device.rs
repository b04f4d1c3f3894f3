//! Device and operating system classification from User-Agent strings
//!
//! Both classifiers walk an ordered rule table and stop at the first match.
//! Several markers overlap (iPad user agents mention "like Mac OS X", Android
//! user agents mention "Linux"), so table order is part of the contract.
//! The labels are persisted and compared across reports; do not reword them.

use regex::Regex;
use std::sync::LazyLock;

use super::UNKNOWN_LABEL;

pub const ANDROID_TABLET: &str = "Android 平板";
pub const ANDROID_PHONE: &str = "Android 手機";
pub const GENERIC_TABLET: &str = "平板";
pub const OTHER_PHONE: &str = "其他手機";
pub const OTHER_COMPUTER: &str = "其他電腦";
pub const OTHER_OS: &str = "其他";

static IOS_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"os\s+(\d+)[._](\d+)").expect("valid iOS version pattern"));
static ANDROID_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"android\s+(\d+)(?:[._](\d+))?").expect("valid Android version pattern")
});
static MACOS_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"mac\s+os\s+x\s+(\d+)[._](\d+)(?:[._](\d+))?").expect("valid macOS version pattern")
});

/// Predicate over a lowercased user agent
#[derive(Clone, Copy)]
enum Matcher {
    /// Matches when any of the substrings is present
    Any(&'static [&'static str]),
    Func(fn(&str) -> bool),
}

impl Matcher {
    fn matches(&self, ua: &str) -> bool {
        match self {
            Matcher::Any(needles) => needles.iter().any(|n| ua.contains(n)),
            Matcher::Func(f) => f(ua),
        }
    }
}

struct DeviceRule {
    matcher: Matcher,
    label: &'static str,
}

const DEVICE_RULES: &[DeviceRule] = &[
    DeviceRule {
        matcher: Matcher::Any(&["ipad"]),
        label: "iPad",
    },
    DeviceRule {
        matcher: Matcher::Any(&["iphone"]),
        label: "iPhone",
    },
    DeviceRule {
        matcher: Matcher::Any(&["ipod"]),
        label: "iPod",
    },
    DeviceRule {
        matcher: Matcher::Func(is_android_tablet),
        label: ANDROID_TABLET,
    },
    DeviceRule {
        matcher: Matcher::Any(&["android"]),
        label: ANDROID_PHONE,
    },
    DeviceRule {
        matcher: Matcher::Any(&["tablet", "playbook", "kindle"]),
        label: GENERIC_TABLET,
    },
    DeviceRule {
        matcher: Matcher::Any(&["macintosh", "mac os x", "macos"]),
        label: "Mac",
    },
    DeviceRule {
        matcher: Matcher::Any(&["windows"]),
        label: "Windows PC",
    },
    DeviceRule {
        matcher: Matcher::Func(is_desktop_linux),
        label: "Linux",
    },
    DeviceRule {
        matcher: Matcher::Any(&["cros"]),
        label: "Chrome OS",
    },
    DeviceRule {
        matcher: Matcher::Any(&["mobile", "blackberry", "windows phone"]),
        label: OTHER_PHONE,
    },
];

struct OsRule {
    matcher: Matcher,
    label: fn(&str) -> String,
}

const OS_RULES: &[OsRule] = &[
    OsRule {
        matcher: Matcher::Any(&["iphone", "ipad", "ipod"]),
        label: ios_label,
    },
    OsRule {
        matcher: Matcher::Any(&["android"]),
        label: android_label,
    },
    OsRule {
        matcher: Matcher::Any(&["macintosh", "mac os x", "macos"]),
        label: macos_label,
    },
    OsRule {
        matcher: Matcher::Any(&["windows"]),
        label: windows_label,
    },
    OsRule {
        matcher: Matcher::Any(&["linux"]),
        label: linux_label,
    },
    OsRule {
        matcher: Matcher::Any(&["cros"]),
        label: chrome_os_label,
    },
];

/// Windows NT kernel markers, most specific first
const WINDOWS_VERSIONS: &[(&[&str], &str)] = &[
    (&["windows nt 10", "windows 10"], "Windows 10/11"),
    (&["windows nt 6.3"], "Windows 8.1"),
    (&["windows nt 6.2"], "Windows 8"),
    (&["windows nt 6.1"], "Windows 7"),
];

/// Device and OS labels for one user agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub device_type: &'static str,
    pub os: String,
}

pub fn classify(user_agent: &str) -> Classification {
    Classification {
        device_type: classify_device(user_agent),
        os: classify_os(user_agent),
    }
}

/// Map a user agent to a device-type label
pub fn classify_device(user_agent: &str) -> &'static str {
    if user_agent.is_empty() {
        return UNKNOWN_LABEL;
    }

    let ua = user_agent.to_lowercase();
    DEVICE_RULES
        .iter()
        .find(|rule| rule.matcher.matches(&ua))
        .map(|rule| rule.label)
        .unwrap_or(OTHER_COMPUTER)
}

/// Map a user agent to an OS label, with a version where one can be read
pub fn classify_os(user_agent: &str) -> String {
    let ua = user_agent.to_lowercase();
    OS_RULES
        .iter()
        .find(|rule| rule.matcher.matches(&ua))
        .map(|rule| (rule.label)(&ua))
        .unwrap_or_else(|| OTHER_OS.to_string())
}

fn is_android_tablet(ua: &str) -> bool {
    ua.contains("android")
        && (ua.contains("tablet") || ua.contains("pad") || !ua.contains("mobile"))
}

fn is_desktop_linux(ua: &str) -> bool {
    ua.contains("linux") && !ua.contains("android")
}

fn ios_label(ua: &str) -> String {
    match IOS_VERSION.captures(ua) {
        Some(caps) => format!("iOS {}.{}", &caps[1], &caps[2]),
        None => "iOS".to_string(),
    }
}

fn android_label(ua: &str) -> String {
    match ANDROID_VERSION.captures(ua) {
        Some(caps) => match caps.get(2) {
            Some(minor) => format!("Android {}.{}", &caps[1], minor.as_str()),
            None => format!("Android {}", &caps[1]),
        },
        None => "Android".to_string(),
    }
}

fn macos_label(ua: &str) -> String {
    match MACOS_VERSION.captures(ua) {
        Some(caps) => match caps.get(3) {
            Some(patch) => format!("macOS {}.{}.{}", &caps[1], &caps[2], patch.as_str()),
            None => format!("macOS {}.{}", &caps[1], &caps[2]),
        },
        None => "macOS".to_string(),
    }
}

fn linux_label(_: &str) -> String {
    "Linux".to_string()
}

fn chrome_os_label(_: &str) -> String {
    "Chrome OS".to_string()
}

fn windows_label(ua: &str) -> String {
    WINDOWS_VERSIONS
        .iter()
        .find(|(markers, _)| markers.iter().any(|m| ua.contains(m)))
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| "Windows".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 15_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Mobile/15E148 Safari/604.1";
    const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1";
    const PIXEL: &str = "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.0.0 Mobile Safari/537.36";
    const GALAXY_TAB: &str = "Mozilla/5.0 (Linux; Android 12.1; SM-X700) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.0.0 Safari/537.36";
    const MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.0.0 Safari/537.36";
    const WIN10: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.0.0 Safari/537.36";
    const UBUNTU: &str = "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/118.0";
    const CHROMEBOOK: &str = "Mozilla/5.0 (X11; CrOS x86_64 14541.0.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.0.0 Safari/537.36";

    #[test]
    fn test_empty_user_agent() {
        assert_eq!(classify_device(""), UNKNOWN_LABEL);
        assert_eq!(classify_os(""), OTHER_OS);
    }

    #[test]
    fn test_ipad() {
        let result = classify(IPAD);
        assert_eq!(result.device_type, "iPad");
        assert_eq!(result.os, "iOS 15.0");
    }

    #[test]
    fn test_iphone() {
        let result = classify(IPHONE);
        assert_eq!(result.device_type, "iPhone");
        assert_eq!(result.os, "iOS 17.1");
    }

    #[test]
    fn test_ipod_without_version() {
        let result = classify("Mozilla/5.0 (iPod touch)");
        assert_eq!(result.device_type, "iPod");
        assert_eq!(result.os, "iOS");
    }

    #[test]
    fn test_android_phone() {
        let result = classify(PIXEL);
        assert_eq!(result.device_type, ANDROID_PHONE);
        assert_eq!(result.os, "Android 13");
    }

    #[test]
    fn test_android_tablet_without_mobile_marker() {
        let result = classify(GALAXY_TAB);
        assert_eq!(result.device_type, ANDROID_TABLET);
        assert_eq!(result.os, "Android 12.1");
    }

    #[test]
    fn test_android_tablet_marker_wins_over_mobile() {
        assert_eq!(
            classify_device("Mozilla/5.0 (Linux; Android 11; Lenovo Tablet) Mobile"),
            ANDROID_TABLET
        );
        assert_eq!(
            classify_device("Mozilla/5.0 (Linux; Android 11; Xiaomi Pad 5) Mobile"),
            ANDROID_TABLET
        );
    }

    #[test]
    fn test_ipad_marker_precedes_android_rules() {
        // "mipad" contains "ipad", and the iPad rule runs first
        assert_eq!(
            classify_device("Mozilla/5.0 (Linux; Android 11; MiPad 5) Mobile"),
            "iPad"
        );
    }

    #[test]
    fn test_android_without_version() {
        assert_eq!(classify_os("Dalvik (Linux; U; Android; Mobile)"), "Android");
    }

    #[test]
    fn test_generic_tablet() {
        assert_eq!(
            classify_device("Mozilla/5.0 (Kindle Fire) Silk/3.0"),
            GENERIC_TABLET
        );
        assert_eq!(
            classify_device("Mozilla/5.0 (PlayBook; U; RIM Tablet OS 2.1.0)"),
            GENERIC_TABLET
        );
    }

    #[test]
    fn test_mac() {
        let result = classify(MAC);
        assert_eq!(result.device_type, "Mac");
        assert_eq!(result.os, "macOS 10.15.7");
    }

    #[test]
    fn test_mac_two_part_version() {
        assert_eq!(
            classify_os("Mozilla/5.0 (Macintosh; Intel Mac OS X 14.1) Safari"),
            "macOS 14.1"
        );
        assert_eq!(classify_os("SomeApp/1.0 macOS"), "macOS");
    }

    #[test]
    fn test_windows_versions() {
        assert_eq!(classify_device(WIN10), "Windows PC");
        assert_eq!(classify_os(WIN10), "Windows 10/11");
        assert_eq!(classify_os("Mozilla/5.0 (Windows NT 6.3; Win64)"), "Windows 8.1");
        assert_eq!(classify_os("Mozilla/5.0 (Windows NT 6.2; Win64)"), "Windows 8");
        assert_eq!(classify_os("Mozilla/5.0 (Windows NT 6.1; WOW64)"), "Windows 7");
        assert_eq!(classify_os("Mozilla/5.0 (Windows NT 5.1)"), "Windows");
    }

    #[test]
    fn test_linux() {
        let result = classify(UBUNTU);
        assert_eq!(result.device_type, "Linux");
        assert_eq!(result.os, "Linux");
    }

    #[test]
    fn test_chrome_os() {
        let result = classify(CHROMEBOOK);
        assert_eq!(result.device_type, "Chrome OS");
        assert_eq!(result.os, "Chrome OS");
    }

    #[test]
    fn test_other_phone() {
        assert_eq!(
            classify_device("BlackBerry9700/5.0.0.351 Profile/MIDP-2.1"),
            OTHER_PHONE
        );
        assert_eq!(classify_device("Opera/9.80 (J2ME/MIDP; Opera Mini) Mobile"), OTHER_PHONE);
    }

    #[test]
    fn test_windows_phone_hits_earlier_rules() {
        assert_eq!(
            classify_device("Mozilla/5.0 (Windows Phone 10.0; Android 6.0.1) Mobile"),
            ANDROID_PHONE
        );
        assert_eq!(
            classify_device("Mozilla/5.0 (compatible; MSIE 10.0; Windows Phone 8.0)"),
            "Windows PC"
        );
    }

    #[test]
    fn test_other_computer_and_os() {
        assert_eq!(classify_device("curl/8.4.0"), OTHER_COMPUTER);
        assert_eq!(classify_device("Unknown"), OTHER_COMPUTER);
        assert_eq!(classify_os("curl/8.4.0"), OTHER_OS);
    }

    #[test]
    fn test_classification_is_case_insensitive_and_pure() {
        assert_eq!(classify(IPAD), classify(&IPAD.to_uppercase()));
        assert_eq!(classify(PIXEL), classify(PIXEL));
    }
}
