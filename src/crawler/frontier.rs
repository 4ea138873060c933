//! Frontier selection
//!
//! Picks the next Url to crawl straight from storage. Nothing is kept in
//! memory between calls, so restarts and concurrent writers are always seen.
//!
//! Selection order:
//! 1. Unvisited Urls on domains that were never crawled
//! 2. Unvisited Urls, preferring domains crawled longest ago
//! 3. Urls last crawled before `now - minimum_crawl_interval`

use crate::config::CrawlerConfig;
use crate::state::UrlRecord;
use crate::storage::{Storage, StorageResult};
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy)]
pub struct FrontierSelector {
    minimum_crawl_interval: Duration,
}

impl FrontierSelector {
    pub fn new(minimum_crawl_interval: Duration) -> Self {
        Self {
            minimum_crawl_interval,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.minimum_crawl_interval())
    }

    /// Returns the next Url to crawl, or None when nothing is due
    pub fn select_next<S>(&self, storage: &S, now: DateTime<Utc>) -> StorageResult<Option<UrlRecord>>
    where
        S: Storage + ?Sized,
    {
        if let Some(url) = storage.next_url_on_unvisited_domain()? {
            tracing::trace!("Selected {} from a never-visited domain", url.url);
            return Ok(Some(url));
        }

        if let Some(url) = storage.next_unvisited_url()? {
            tracing::trace!("Selected unvisited {}", url.url);
            return Ok(Some(url));
        }

        let cutoff = now - self.minimum_crawl_interval;
        let stale = storage.next_stale_url(cutoff)?;
        if let Some(url) = &stale {
            tracing::trace!("Selected {} for re-crawl", url.url);
        }

        Ok(stale)
    }
}
