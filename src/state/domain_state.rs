use chrono::{DateTime, Duration, Utc};

/// A crawled host
///
/// Domains are created lazily the first time a URL on the host is seen and
/// are never deleted by the crawler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    /// Storage key, assigned in creation order
    pub id: i64,

    /// Authority of the host (`host` or `host:port`), unique
    pub hostname: String,

    /// Last time any URL on this domain was crawled
    pub visited_at: Option<DateTime<Utc>>,

    /// Agent-filtered robots.txt rules, one directive per line
    pub robots_txt: Option<String>,

    /// Last time robots.txt was acquired, successfully or not
    pub robots_txt_updated_at: Option<DateTime<Utc>>,
}

impl Domain {
    /// Creates a never-visited domain with no robots.txt cached
    pub fn new(id: i64, hostname: impl Into<String>) -> Self {
        Self {
            id,
            hostname: hostname.into(),
            visited_at: None,
            robots_txt: None,
            robots_txt_updated_at: None,
        }
    }

    pub fn is_visited(&self) -> bool {
        self.visited_at.is_some()
    }

    /// Checks if the cached robots.txt must be fetched again
    ///
    /// A domain whose robots.txt was never fetched is always stale.
    pub fn is_robots_stale(&self, refresh_interval: Duration, now: DateTime<Utc>) -> bool {
        match self.robots_txt_updated_at {
            Some(updated_at) => updated_at + refresh_interval < now,
            None => true,
        }
    }
}
