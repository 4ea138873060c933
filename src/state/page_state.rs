use crate::url::fingerprint;
use chrono::{DateTime, Utc};
use std::fmt;

/// A crawl target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    /// Storage key, assigned in creation order
    pub id: i64,

    /// Full absolute URL
    pub url: String,

    /// SHA-256 of `url`; always kept in sync by [`UrlRecord::set_url`]
    pub fingerprint: String,

    /// Owning domain
    pub domain_id: i64,

    /// Last crawl attempt, successful or not
    pub visited_at: Option<DateTime<Utc>>,

    /// Body of the last successful fetch
    pub content: Option<String>,
}

impl UrlRecord {
    /// Creates an unvisited record, computing its fingerprint
    pub fn new(id: i64, url: impl Into<String>, domain_id: i64) -> Self {
        let url = url.into();
        Self {
            id,
            fingerprint: fingerprint(&url),
            url,
            domain_id,
            visited_at: None,
            content: None,
        }
    }

    /// Replaces the URL and recomputes the fingerprint
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
        self.fingerprint = fingerprint(&self.url);
    }

    pub fn status(&self) -> UrlStatus {
        match (&self.visited_at, &self.content) {
            (None, _) => UrlStatus::Unvisited,
            (Some(_), Some(_)) => UrlStatus::Crawled,
            (Some(_), None) => UrlStatus::Attempted,
        }
    }
}

impl fmt::Display for UrlRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Crawl state of a Url, derived from its timestamps and content
///
/// `visited_at` is only ever null for URLs that were never attempted; every
/// failed or disallowed attempt moves a URL to `Attempted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlStatus {
    /// Never attempted
    Unvisited,

    /// Last attempt fetched and stored the page
    Crawled,

    /// Attempted without storing content (connection failure, unsupported
    /// content type or robots.txt rejection)
    Attempted,
}

impl UrlStatus {
    pub fn is_unvisited(&self) -> bool {
        matches!(self, Self::Unvisited)
    }
}

impl fmt::Display for UrlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unvisited => "unvisited",
            Self::Crawled => "crawled",
            Self::Attempted => "attempted",
        };
        write!(f, "{}", s)
    }
}
