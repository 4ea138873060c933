use chrono::Duration;
use serde::Deserialize;

/// User agent sent with every request and matched against robots.txt groups
pub const DEFAULT_USER_AGENT: &str = "django_webcrawler";

/// Eight hours between re-crawls of the same URL
pub const DEFAULT_MINIMUM_CRAWL_INTERVAL_SECS: u64 = 8 * 60 * 60;

/// robots.txt is refreshed once a day
pub const DEFAULT_ROBOTS_REFRESH_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub urls: UrlPatternConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// User agent token, also used to select robots.txt groups
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Minimum time before a visited URL becomes eligible again (seconds)
    #[serde(
        rename = "minimum-crawl-interval",
        default = "default_minimum_crawl_interval"
    )]
    pub minimum_crawl_interval: u64,

    /// Time-to-live of a cached robots.txt (seconds)
    #[serde(
        rename = "robots-refresh-interval",
        default = "default_robots_refresh_interval"
    )]
    pub robots_refresh_interval: u64,
}

impl CrawlerConfig {
    pub fn minimum_crawl_interval(&self) -> Duration {
        Duration::seconds(self.minimum_crawl_interval as i64)
    }

    pub fn robots_refresh_interval(&self) -> Duration {
        Duration::seconds(self.robots_refresh_interval as i64)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            minimum_crawl_interval: DEFAULT_MINIMUM_CRAWL_INTERVAL_SECS,
            robots_refresh_interval: DEFAULT_ROBOTS_REFRESH_INTERVAL_SECS,
        }
    }
}

/// Operator allow/deny URL patterns
///
/// Both lists are ordered regular expressions matched against the start of
/// the URL string. Deny wins over allow, and a URL matching neither list is
/// not crawlable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UrlPatternConfig {
    #[serde(default)]
    pub allowed: Vec<String>,

    #[serde(default)]
    pub disallowed: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_minimum_crawl_interval() -> u64 {
    DEFAULT_MINIMUM_CRAWL_INTERVAL_SECS
}

fn default_robots_refresh_interval() -> u64 {
    DEFAULT_ROBOTS_REFRESH_INTERVAL_SECS
}

fn default_database_path() -> String {
    "./crawl.db".to_string()
}
