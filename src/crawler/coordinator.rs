//! Crawler coordinator - main crawl orchestration logic
//!
//! This module ties the collaborators together:
//! - Seeding the frontier with operator-supplied URLs
//! - Picking the next Url through the frontier selector
//! - Fetching, checking and storing pages
//! - Recording the link graph and new Urls found on each page
//! - Deprioritizing or deleting Urls that fail

use crate::config::Config;
use crate::crawler::frontier::FrontierSelector;
use crate::crawler::parser::{HtmlLinkExtractor, LinkExtractor};
use crate::crawler::Fetcher;
use crate::robots::RobotsCache;
use crate::state::{Domain, UrlRecord};
use crate::storage::Storage;
use crate::url::{
    authority, is_supported_scheme, normalize_link, parse_absolute, UrlFilter, MAX_URL_LENGTH,
};
use crate::{ConfigResult, CrawlError, Result, UrlError};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::time::Instant;
use url::Url;

/// What one successful crawl attempt found on the page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Anchor hrefs present in the document
    pub hrefs_seen: usize,
    /// Hrefs that passed every check and now have an edge
    pub links_recorded: usize,
    /// Urls created by this attempt
    pub new_urls: usize,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Urls fetched and stored
    pub crawled: usize,
    /// True when the run stopped because nothing was due
    pub exhausted: bool,
}

/// Main crawler coordinator structure
///
/// All mutating operations take `&mut self`, so a coordinator never has two
/// fetches in flight.
pub struct Coordinator<S: Storage, F: Fetcher> {
    storage: S,
    fetcher: F,
    extractor: Box<dyn LinkExtractor>,
    filter: UrlFilter,
    robots: RobotsCache,
    frontier: FrontierSelector,
}

impl<S: Storage, F: Fetcher> Coordinator<S, F> {
    /// Creates a coordinator from configuration
    ///
    /// Fails if any configured URL pattern does not compile.
    pub fn new(config: &Config, storage: S, fetcher: F) -> ConfigResult<Self> {
        Ok(Self {
            storage,
            fetcher,
            extractor: Box::new(HtmlLinkExtractor),
            filter: UrlFilter::from_config(&config.urls)?,
            robots: RobotsCache::from_config(&config.crawler),
            frontier: FrontierSelector::from_config(&config.crawler),
        })
    }

    /// Replaces the HTML link extractor
    pub fn with_link_extractor(mut self, extractor: Box<dyn LinkExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Adds an operator-supplied URL to the frontier
    ///
    /// Returns `Ok(None)` when the URL is already known.
    pub async fn add_seed_url(&mut self, raw_url: &str) -> Result<Option<UrlRecord>> {
        let url = parse_absolute(raw_url)?;
        check_length(&url)?;

        if !is_supported_scheme(&url) || !self.filter.is_crawlable(url.as_str()) {
            return Err(CrawlError::Disallowed {
                url: url.to_string(),
            });
        }

        if self.storage.url_exists(url.as_str())? {
            tracing::debug!("Seed {} is already known", url);
            return Ok(None);
        }

        let hostname =
            authority(&url).ok_or_else(|| UrlError::MissingHost(url.to_string()))?;
        let mut domain = self.storage.upsert_domain(&hostname)?;

        let now = Utc::now();
        if !self
            .robots
            .is_allowed(&mut self.storage, &self.fetcher, &mut domain, &url, now)
            .await?
        {
            return Err(CrawlError::DisallowedByRobots {
                url: url.to_string(),
            });
        }

        let (record, _) = self.storage.upsert_url(url.as_str(), domain.id)?;
        tracing::info!("Seeded {}", record.url);

        Ok(Some(record))
    }

    /// Performs one fetch-and-process cycle for `url`
    ///
    /// On success the page content is stored and both the Url and its Domain
    /// are marked visited. On failure nothing is written for `url` itself;
    /// the retry loop decides what to do with it.
    pub async fn attempt_crawl(&mut self, url: &mut UrlRecord) -> Result<CrawlReport> {
        let now = Utc::now();
        let page_url =
            Url::parse(&url.url).map_err(|e| UrlError::Parse(format!("{}: {}", url.url, e)))?;

        if !self.filter.is_crawlable(&url.url) {
            return Err(CrawlError::Disallowed {
                url: url.url.clone(),
            });
        }

        let mut domain = self.storage.get_domain(url.domain_id)?;
        if !self
            .robots
            .is_allowed(&mut self.storage, &self.fetcher, &mut domain, &page_url, now)
            .await?
        {
            return Err(CrawlError::DisallowedByRobots {
                url: url.url.clone(),
            });
        }

        tracing::debug!("Fetching {}", url.url);
        let response = self
            .fetcher
            .get(&url.url)
            .await
            .map_err(|e| CrawlError::UnableToConnect {
                url: url.url.clone(),
                reason: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(CrawlError::UnableToConnect {
                url: url.url.clone(),
                reason: format!("HTTP {}", response.status),
            });
        }

        match response.media_type() {
            Some(media_type) if media_type == "text/html" => {}
            other => {
                return Err(CrawlError::UnsupportedContentType {
                    url: url.url.clone(),
                    content_type: other.unwrap_or_else(|| "missing".to_string()),
                });
            }
        }

        let report = self
            .record_links(url, &page_url, &response.body, now)
            .await?;

        self.storage.set_url_content(url.id, &response.body, now)?;
        self.storage.set_domain_visited(domain.id, now)?;
        url.content = Some(response.body);
        url.visited_at = Some(now);

        Ok(report)
    }

    /// Crawls the next due Url, skipping past failures
    ///
    /// Returns the crawled Url, or `Ok(None)` once nothing is due. Recoverable
    /// failures mark the Url and its Domain visited so the frontier moves on.
    /// With `clean_disallowed`, Urls rejected by the URL filter or robots.txt
    /// are deleted instead; without it, a filter rejection is returned.
    pub async fn crawl_next(&mut self, clean_disallowed: bool) -> Result<Option<UrlRecord>> {
        let mut attempted = HashSet::new();

        loop {
            let now = Utc::now();
            let Some(mut url) = self.frontier.select_next(&self.storage, now)? else {
                return Ok(None);
            };

            if !attempted.insert(url.id) {
                tracing::debug!("{} is due again within one call, stopping", url.url);
                return Ok(None);
            }

            match self.attempt_crawl(&mut url).await {
                Ok(report) => {
                    tracing::info!(
                        "Crawled {} ({} links, {} new urls)",
                        url.url,
                        report.links_recorded,
                        report.new_urls
                    );
                    return Ok(Some(url));
                }
                Err(CrawlError::Disallowed { .. } | CrawlError::DisallowedByRobots { .. })
                    if clean_disallowed =>
                {
                    self.storage.delete_url(url.id)?;
                    tracing::info!("Deleted disallowed url {}", url.url);
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!("{}", e);
                    self.mark_attempted(&url, now)?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Crawls until nothing is due or `limit` pages have been stored
    pub async fn run(&mut self, limit: Option<usize>, clean_disallowed: bool) -> Result<RunSummary> {
        let start_time = Instant::now();
        let mut summary = RunSummary::default();

        tracing::info!("Starting crawl");

        loop {
            if limit.is_some_and(|limit| summary.crawled >= limit) {
                tracing::info!("Reached crawl limit of {}", summary.crawled);
                break;
            }

            match self.crawl_next(clean_disallowed).await? {
                Some(_) => {
                    summary.crawled += 1;

                    if summary.crawled % 10 == 0 {
                        let rate = summary.crawled as f64 / start_time.elapsed().as_secs_f64();
                        tracing::info!(
                            "Progress: {} pages crawled, {:.2} pages/sec",
                            summary.crawled,
                            rate
                        );
                    }
                }
                None => {
                    tracing::info!("Frontier is empty, crawl complete");
                    summary.exhausted = true;
                    break;
                }
            }
        }

        tracing::info!(
            "Crawl finished: {} pages in {:.1}s",
            summary.crawled,
            start_time.elapsed().as_secs_f64()
        );

        Ok(summary)
    }

    /// Processes every href on a fetched page into Urls and edges
    async fn record_links(
        &mut self,
        source: &UrlRecord,
        page_url: &Url,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<CrawlReport> {
        let hrefs = self.extractor.extract_hrefs(body);
        let mut report = CrawlReport {
            hrefs_seen: hrefs.len(),
            ..CrawlReport::default()
        };

        for href in &hrefs {
            if href.trim().is_empty() {
                continue;
            }

            let target = match normalize_link(href, page_url) {
                Ok(target) => target,
                Err(e) => {
                    tracing::debug!("Skipping href on {}: {}", source.url, e);
                    continue;
                }
            };

            if target.as_str().len() > MAX_URL_LENGTH
                || !self.filter.is_crawlable(target.as_str())
                || !is_supported_scheme(&target)
            {
                continue;
            }

            let Some(hostname) = authority(&target) else {
                continue;
            };
            let mut target_domain = self.storage.upsert_domain(&hostname)?;

            if !self
                .robots
                .is_allowed(&mut self.storage, &self.fetcher, &mut target_domain, &target, now)
                .await?
            {
                continue;
            }

            let (target_url, created) = self.storage.upsert_url(target.as_str(), target_domain.id)?;
            if created {
                tracing::debug!("Discovered {}", target_url.url);
                report.new_urls += 1;
            }

            self.storage.insert_link(source.id, target_url.id)?;
            report.links_recorded += 1;
        }

        Ok(report)
    }

    /// Marks a failed Url and its Domain visited without storing content
    fn mark_attempted(&mut self, url: &UrlRecord, now: DateTime<Utc>) -> Result<()> {
        self.storage.set_url_visited(url.id, now)?;
        self.storage.set_domain_visited(url.domain_id, now)?;
        Ok(())
    }

    /// Looks up the domain a Url belongs to
    pub fn domain_of(&self, url: &UrlRecord) -> Result<Domain> {
        Ok(self.storage.get_domain(url.domain_id)?)
    }
}

fn check_length(url: &Url) -> std::result::Result<(), UrlError> {
    let len = url.as_str().len();
    if len > MAX_URL_LENGTH {
        return Err(UrlError::TooLong {
            len,
            max: MAX_URL_LENGTH,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UrlPatternConfig;
    use crate::crawler::{FetchError, FetchResponse};
    use crate::state::UrlStatus;
    use crate::storage::SqliteStorage;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned responses; unknown URLs fail to connect
    #[derive(Default)]
    struct MockFetcher {
        responses: HashMap<String, FetchResponse>,
        requests: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        fn html(mut self, url: &str, body: &str) -> Self {
            self.responses.insert(
                url.to_string(),
                FetchResponse {
                    status: 200,
                    content_type: Some("text/html; charset=utf-8".to_string()),
                    body: body.to_string(),
                },
            );
            self
        }

        fn respond(mut self, url: &str, status: u16, content_type: Option<&str>, body: &str) -> Self {
            self.responses.insert(
                url.to_string(),
                FetchResponse {
                    status,
                    content_type: content_type.map(str::to_string),
                    body: body.to_string(),
                },
            );
            self
        }

        fn page_requests(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|url| !url.ends_with("/robots.txt"))
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn get(&self, url: &str) -> std::result::Result<FetchResponse, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Connection("connection refused".to_string()))
        }
    }

    fn config(allowed: &[&str], disallowed: &[&str]) -> Config {
        Config {
            urls: UrlPatternConfig {
                allowed: allowed.iter().map(|s| s.to_string()).collect(),
                disallowed: disallowed.iter().map(|s| s.to_string()).collect(),
            },
            ..Config::default()
        }
    }

    fn coordinator(fetcher: MockFetcher) -> Coordinator<SqliteStorage, MockFetcher> {
        let storage = SqliteStorage::new_in_memory().unwrap();
        Coordinator::new(&config(&["https://example\\.com/"], &[]), storage, fetcher).unwrap()
    }

    #[tokio::test]
    async fn test_seed_creates_unvisited_url() {
        let mut coordinator = coordinator(MockFetcher::default());

        let seeded = coordinator
            .add_seed_url("  https://example.com/start ")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(seeded.url, "https://example.com/start");
        assert_eq!(seeded.status(), UrlStatus::Unvisited);
        let domain = coordinator.domain_of(&seeded).unwrap();
        assert_eq!(domain.hostname, "example.com");
        assert!(domain.robots_txt_updated_at.is_some());
    }

    #[tokio::test]
    async fn test_seed_existing_url_is_noop() {
        let mut coordinator = coordinator(MockFetcher::default());

        coordinator.add_seed_url("https://example.com/").await.unwrap();
        let second = coordinator.add_seed_url("https://example.com/").await.unwrap();

        assert!(second.is_none());
        assert_eq!(coordinator.storage().count_urls().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_seed_rejections() {
        let fetcher = MockFetcher::default().respond(
            "https://example.com/robots.txt",
            200,
            Some("text/plain"),
            "User-agent: *\nDisallow: /private",
        );
        let mut coordinator = coordinator(fetcher);

        assert!(matches!(
            coordinator.add_seed_url("https://other.com/").await,
            Err(CrawlError::Disallowed { .. })
        ));
        assert!(matches!(
            coordinator.add_seed_url("https://example.com/private/x").await,
            Err(CrawlError::DisallowedByRobots { .. })
        ));
        assert!(matches!(
            coordinator.add_seed_url("not a url").await,
            Err(CrawlError::Url(UrlError::Parse(_)))
        ));

        let long = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert!(matches!(
            coordinator.add_seed_url(&long).await,
            Err(CrawlError::Url(UrlError::TooLong { .. }))
        ));

        assert_eq!(coordinator.storage().count_urls().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_crawl_records_links_and_content() {
        let fetcher = MockFetcher::default().html(
            "https://example.com/x",
            r#"<a href="/page">a</a>
               <a href="/page">again</a>
               <a href="/page#section">anchor</a>
               <a href="">empty</a>
               <a href="mailto:someone@example.com">mail</a>
               <a href="https://elsewhere.org/">filtered</a>"#,
        );
        let mut coordinator = coordinator(fetcher);
        let mut seed = coordinator
            .add_seed_url("https://example.com/x")
            .await
            .unwrap()
            .unwrap();

        let report = coordinator.attempt_crawl(&mut seed).await.unwrap();

        assert_eq!(report.hrefs_seen, 6);
        assert_eq!(report.links_recorded, 3);
        assert_eq!(report.new_urls, 1);

        let storage = coordinator.storage();
        let page = storage.get_url_by_url("https://example.com/page").unwrap().unwrap();
        assert_eq!(page.status(), UrlStatus::Unvisited);
        assert_eq!(storage.count_links().unwrap(), 1);
        assert_eq!(storage.get_incoming_links(page.id).unwrap().len(), 1);
        assert!(storage.get_url_by_url("https://elsewhere.org/").unwrap().is_none());

        let crawled = storage.get_url(seed.id).unwrap();
        assert_eq!(crawled.status(), UrlStatus::Crawled);
        assert!(storage.get_domain(seed.domain_id).unwrap().is_visited());
        assert_eq!(seed.status(), UrlStatus::Crawled);
    }

    #[tokio::test]
    async fn test_links_disallowed_by_robots_are_not_recorded() {
        let fetcher = MockFetcher::default()
            .respond(
                "https://example.com/robots.txt",
                200,
                Some("text/plain"),
                "User-agent: *\nDisallow: /secret",
            )
            .html(
                "https://example.com/",
                r#"<a href="/secret/page">s</a><a href="/open">o</a>"#,
            );
        let mut coordinator = coordinator(fetcher);
        let mut seed = coordinator
            .add_seed_url("https://example.com/")
            .await
            .unwrap()
            .unwrap();

        let report = coordinator.attempt_crawl(&mut seed).await.unwrap();

        assert_eq!(report.links_recorded, 1);
        let storage = coordinator.storage();
        assert!(!storage.url_exists("https://example.com/secret/page").unwrap());
        assert!(storage.url_exists("https://example.com/open").unwrap());
    }

    #[tokio::test]
    async fn test_crawl_next_prefers_unvisited_domain() {
        let fetcher = MockFetcher::default()
            .html("https://example.com/a", "")
            .html("https://example.com/b", "");
        let mut coordinator = coordinator(fetcher);

        let storage = coordinator.storage_mut();
        let visited = storage.upsert_domain("example.com:8443").unwrap();
        storage
            .upsert_url("https://example.com:8443/older", visited.id)
            .unwrap();
        storage.set_domain_visited(visited.id, Utc::now()).unwrap();

        coordinator.add_seed_url("https://example.com/a").await.unwrap();

        let crawled = coordinator.crawl_next(false).await.unwrap().unwrap();
        assert_eq!(crawled.url, "https://example.com/a");
    }

    #[tokio::test]
    async fn test_unable_to_connect_marks_visited() {
        let mut coordinator = coordinator(MockFetcher::default());
        let seed = coordinator
            .add_seed_url("https://example.com/down")
            .await
            .unwrap()
            .unwrap();

        let result = coordinator.crawl_next(false).await.unwrap();
        assert!(result.is_none());

        let url = coordinator.storage().get_url(seed.id).unwrap();
        assert!(url.visited_at.is_some());
        assert!(url.content.is_none());
        assert!(coordinator.domain_of(&url).unwrap().visited_at.is_some());
    }

    #[tokio::test]
    async fn test_http_error_and_content_type_are_recoverable() {
        let fetcher = MockFetcher::default()
            .respond("https://example.com/missing", 404, Some("text/html"), "nope")
            .respond("https://example.com/image", 200, Some("image/png"), "")
            .respond("https://example.com/untyped", 200, None, "")
            .html("https://example.com/ok", "<p>fine</p>");
        let mut coordinator = coordinator(fetcher);
        for path in ["missing", "image", "untyped", "ok"] {
            coordinator
                .add_seed_url(&format!("https://example.com/{}", path))
                .await
                .unwrap();
        }

        let crawled = coordinator.crawl_next(false).await.unwrap().unwrap();
        assert_eq!(crawled.url, "https://example.com/ok");

        let storage = coordinator.storage();
        for path in ["missing", "image", "untyped"] {
            let url = storage
                .get_url_by_url(&format!("https://example.com/{}", path))
                .unwrap()
                .unwrap();
            assert_eq!(url.status(), UrlStatus::Attempted, "{}", path);
        }
    }

    #[tokio::test]
    async fn test_robots_rejection_with_clean_deletes() {
        let mut coordinator = coordinator(MockFetcher::default());
        let seed = coordinator
            .add_seed_url("https://example.com/later-blocked")
            .await
            .unwrap()
            .unwrap();
        coordinator
            .storage_mut()
            .set_domain_robots(seed.domain_id, "Disallow: /later", Utc::now())
            .unwrap();

        assert!(coordinator.crawl_next(true).await.unwrap().is_none());
        assert!(coordinator.storage().get_url(seed.id).is_err());
        assert!(coordinator.domain_of(&seed).is_ok());
    }

    #[tokio::test]
    async fn test_robots_rejection_without_clean_marks_visited() {
        let mut coordinator = coordinator(MockFetcher::default());
        let seed = coordinator
            .add_seed_url("https://example.com/later-blocked")
            .await
            .unwrap()
            .unwrap();
        coordinator
            .storage_mut()
            .set_domain_robots(seed.domain_id, "Disallow: /later", Utc::now())
            .unwrap();

        assert!(coordinator.crawl_next(false).await.unwrap().is_none());

        let url = coordinator.storage().get_url(seed.id).unwrap();
        assert_eq!(url.status(), UrlStatus::Attempted);
        assert!(coordinator.domain_of(&url).unwrap().is_visited());
        assert!(coordinator.fetcher.page_requests().is_empty());
    }

    #[tokio::test]
    async fn test_filter_rejection_propagates_or_deletes() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let mut coordinator = Coordinator::new(
            &config(&["https://example\\.com/"], &["https://example\\.com/old/"]),
            storage,
            MockFetcher::default(),
        )
        .unwrap();

        let domain = coordinator.storage_mut().upsert_domain("example.com").unwrap();
        let (stale, _) = coordinator
            .storage_mut()
            .upsert_url("https://example.com/old/page", domain.id)
            .unwrap();

        assert!(matches!(
            coordinator.crawl_next(false).await,
            Err(CrawlError::Disallowed { .. })
        ));
        assert!(coordinator.storage().get_url(stale.id).is_ok());

        assert!(coordinator.crawl_next(true).await.unwrap().is_none());
        assert!(coordinator.storage().get_url(stale.id).is_err());
    }

    #[tokio::test]
    async fn test_run_follows_links_until_exhausted() {
        let fetcher = MockFetcher::default()
            .html("https://example.com/", r#"<a href="/a">a</a><a href="/b">b</a>"#)
            .html("https://example.com/a", r#"<a href="/">home</a><a href="/b">b</a>"#)
            .html("https://example.com/b", r#"<a href="/a">a</a>"#);
        let mut coordinator = coordinator(fetcher);
        coordinator.add_seed_url("https://example.com/").await.unwrap();

        let summary = coordinator.run(None, false).await.unwrap();

        assert_eq!(
            summary,
            RunSummary {
                crawled: 3,
                exhausted: true
            }
        );
        assert_eq!(coordinator.storage().count_links().unwrap(), 5);
        assert_eq!(coordinator.fetcher.page_requests().len(), 3);
    }

    #[tokio::test]
    async fn test_run_stops_at_limit() {
        let fetcher = MockFetcher::default()
            .html("https://example.com/", r#"<a href="/a">a</a>"#)
            .html("https://example.com/a", "");
        let mut coordinator = coordinator(fetcher);
        coordinator.add_seed_url("https://example.com/").await.unwrap();

        let summary = coordinator.run(Some(1), false).await.unwrap();

        assert_eq!(summary.crawled, 1);
        assert!(!summary.exhausted);
        assert_eq!(
            coordinator
                .storage()
                .count_urls_by_status(UrlStatus::Unvisited)
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_custom_link_extractor() {
        struct Fixed;
        impl LinkExtractor for Fixed {
            fn extract_hrefs(&self, _html: &str) -> Vec<String> {
                vec!["/from-extractor".to_string()]
            }
        }

        let fetcher = MockFetcher::default().html("https://example.com/", "ignored");
        let mut coordinator = coordinator(fetcher).with_link_extractor(Box::new(Fixed));
        let mut seed = coordinator
            .add_seed_url("https://example.com/")
            .await
            .unwrap()
            .unwrap();

        coordinator.attempt_crawl(&mut seed).await.unwrap();
        assert!(coordinator
            .storage()
            .url_exists("https://example.com/from-extractor")
            .unwrap());
    }
}
