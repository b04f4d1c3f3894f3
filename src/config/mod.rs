use serde::{Deserialize, Serialize};

pub const DEFAULT_GEOIP_API_URL: &str =
    "http://ip-api.com/json/{ip}?fields=status,country,regionName,city,isp,countryCode&lang=zh-CN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub shortener: ShortenerConfig,
    pub analytics: AnalyticsConfig,
    pub preview: PreviewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Public base URL used when building short URLs, e.g. `https://xsong.us`.
    /// When unset the base is derived from the request's Host header.
    pub base_url: Option<String>,
    /// The service's own domain. Referrers containing it count as direct visits.
    pub domain: String,
    /// Logs every recorded click with its raw header values.
    pub debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenerConfig {
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Geolocation endpoint; `{ip}` is replaced with the visitor address.
    pub geoip_api_url: String,
    pub geoip_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    pub fetch_timeout_ms: u64,
    pub max_body_bytes: usize,
}

impl ShortenerConfig {
    pub const fn default_max_attempts() -> u32 {
        16
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::Sqlite,
            url: "sqlite://./shorturl.db?mode=rwc".to_string(),
            max_connections: 10,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            domain: "xsong.us".to_string(),
            debug: false,
        }
    }
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self {
            max_attempts: Self::default_max_attempts(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            geoip_api_url: DEFAULT_GEOIP_API_URL.to_string(),
            geoip_timeout_ms: 2000,
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: 3000,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str =
            std::env::var("DATABASE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());

        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            "sqlite" => DatabaseBackend::Sqlite,
            other => {
                tracing::warn!(
                    "Unknown DATABASE_BACKEND '{other}', falling back to 'sqlite'. Supported values: sqlite, postgres"
                );
                DatabaseBackend::Sqlite
            }
        };

        let database_defaults = DatabaseConfig::default();
        let database_url = std::env::var("DATABASE_URL").unwrap_or(database_defaults.url);
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let base_url = std::env::var("BASE_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty());
        let domain = std::env::var("SITE_DOMAIN").unwrap_or(SiteConfig::default().domain);
        let debug = std::env::var("DEBUG")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let max_attempts = std::env::var("SHORT_CODE_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or_else(ShortenerConfig::default_max_attempts);

        let analytics_defaults = AnalyticsConfig::default();
        let geoip_api_url =
            std::env::var("GEOIP_API_URL").unwrap_or(analytics_defaults.geoip_api_url);
        let geoip_timeout_ms = std::env::var("GEOIP_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(analytics_defaults.geoip_timeout_ms);

        let preview_defaults = PreviewConfig::default();
        let fetch_timeout_ms = std::env::var("PREVIEW_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(preview_defaults.fetch_timeout_ms);
        let max_body_bytes = std::env::var("PREVIEW_MAX_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(preview_defaults.max_body_bytes);

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            server: ServerConfig { host, port },
            site: SiteConfig {
                base_url,
                domain,
                debug,
            },
            shortener: ShortenerConfig { max_attempts },
            analytics: AnalyticsConfig {
                geoip_api_url,
                geoip_timeout_ms,
            },
            preview: PreviewConfig {
                fetch_timeout_ms,
                max_body_bytes,
            },
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" 1 "));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("on-ish"));
    }

    #[test]
    fn test_default_geoip_template_has_placeholder() {
        assert!(AnalyticsConfig::default().geoip_api_url.contains("{ip}"));
    }
}
