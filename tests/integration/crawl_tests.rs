//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end against a SQLite database on disk.

use std::path::Path;
use tempfile::TempDir;
use webcrawler::config::{Config, OutputConfig, UrlPatternConfig};
use webcrawler::crawler::{Coordinator, Fetcher, HttpFetcher};
use webcrawler::state::UrlStatus;
use webcrawler::storage::{SqliteStorage, Storage};
use webcrawler::CrawlError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration that allows everything on `base_url`
fn create_test_config(base_url: &str, disallowed: Vec<String>, db_path: &Path) -> Config {
    Config {
        urls: UrlPatternConfig {
            allowed: vec![regex::escape(base_url)],
            disallowed,
        },
        output: OutputConfig {
            database_path: db_path.display().to_string(),
        },
        ..Config::default()
    }
}

fn create_coordinator(config: &Config) -> Coordinator<SqliteStorage, HttpFetcher> {
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .expect("Failed to open DB");
    let fetcher = HttpFetcher::new(&config.crawler.user_agent).expect("Failed to build client");
    Coordinator::new(config, storage, fetcher).expect("Failed to create coordinator")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html; charset=utf-8")
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_http_fetcher_reports_html_content_type() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", html("<p>home</p>")).await;

    let fetcher = HttpFetcher::new("webcrawler").unwrap();
    let response = fetcher
        .get(&format!("{}/", mock_server.uri()))
        .await
        .expect("Fetch failed");

    assert_eq!(response.status, 200);
    assert_eq!(response.media_type().as_deref(), Some("text/html"));
    assert_eq!(response.body, "<p>home</p>");
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("crawl.db");

    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(
        &mock_server,
        "/",
        html(&format!(
            r#"<html><body>
            <a href="{}/page1">Page 1</a>
            <a href="page2">Page 2</a>
            <a href="/page1#top">Page 1 again</a>
            </body></html>"#,
            base_url
        )),
    )
    .await;
    mount_page(&mock_server, "/page1", html(r#"<a href="/">Home</a>"#)).await;
    mount_page(&mock_server, "/page2", html("<p>Content 2</p>")).await;

    let config = create_test_config(&base_url, vec![], &db_path);
    let mut coordinator = create_coordinator(&config);

    let seed = coordinator
        .add_seed_url(&format!("{}/", base_url))
        .await
        .expect("Seeding failed");
    assert!(seed.is_some());

    let summary = coordinator.run(None, false).await.expect("Crawl failed");
    assert_eq!(summary.crawled, 3);
    assert!(summary.exhausted);
    drop(coordinator);

    // Reopen from disk to verify persisted state
    let storage = SqliteStorage::new(&db_path).expect("Failed to open DB");
    assert_eq!(storage.count_urls().unwrap(), 3);
    assert_eq!(storage.count_urls_by_status(UrlStatus::Crawled).unwrap(), 3);
    assert_eq!(storage.count_domains().unwrap(), 1);
    assert_eq!(storage.count_visited_domains().unwrap(), 1);
    // / -> page1, / -> page2, page1 -> /
    assert_eq!(storage.count_links().unwrap(), 3);

    let home = storage
        .get_url_by_url(&format!("{}/", base_url))
        .unwrap()
        .unwrap();
    let domain = storage.get_domain(home.domain_id).unwrap();
    assert_eq!(domain.robots_txt.as_deref(), Some("Allow: /"));
    assert!(home.content.unwrap().contains("Page 1"));
}

#[tokio::test]
async fn test_robots_txt_is_respected() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("crawl.db");

    mount_robots(
        &mock_server,
        "User-agent: *\nDisallow: /private\n\nUser-agent: otherbot\nDisallow: /",
    )
    .await;
    mount_page(
        &mock_server,
        "/",
        html(r#"<a href="/private/secret">Secret</a><a href="/public">Public</a>"#),
    )
    .await;
    mount_page(&mock_server, "/public", html("<p>public</p>")).await;
    Mock::given(method("GET"))
        .and(path("/private/secret"))
        .respond_with(html("<p>secret</p>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, vec![], &db_path);
    let mut coordinator = create_coordinator(&config);
    coordinator
        .add_seed_url(&format!("{}/", base_url))
        .await
        .unwrap();

    let summary = coordinator.run(None, false).await.unwrap();
    assert_eq!(summary.crawled, 2);

    let storage = coordinator.storage();
    assert!(!storage
        .url_exists(&format!("{}/private/secret", base_url))
        .unwrap());
    assert!(storage.url_exists(&format!("{}/public", base_url)).unwrap());

    let rejected = coordinator
        .add_seed_url(&format!("{}/private/other", base_url))
        .await;
    assert!(matches!(rejected, Err(CrawlError::DisallowedByRobots { .. })));
}

#[tokio::test]
async fn test_missing_robots_allows_everything() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("crawl.db");

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/", html("<p>home</p>")).await;

    let config = create_test_config(&base_url, vec![], &db_path);
    let mut coordinator = create_coordinator(&config);
    let seed = coordinator
        .add_seed_url(&format!("{}/", base_url))
        .await
        .unwrap()
        .unwrap();

    let crawled = coordinator.crawl_next(false).await.unwrap();
    assert_eq!(crawled.map(|u| u.id), Some(seed.id));

    let domain = coordinator.domain_of(&seed).unwrap();
    assert_eq!(domain.robots_txt.as_deref(), Some(""));
    assert!(domain.robots_txt_updated_at.is_some());
}

#[tokio::test]
async fn test_failures_are_deprioritized() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("crawl.db");

    mount_robots(&mock_server, "").await;
    mount_page(
        &mock_server,
        "/",
        html(r#"<a href="/broken">b</a><a href="/logo.png">l</a><a href="/ok">o</a>"#),
    )
    .await;
    mount_page(&mock_server, "/broken", ResponseTemplate::new(500)).await;
    mount_page(
        &mock_server,
        "/logo.png",
        ResponseTemplate::new(200)
            .set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47])
            .insert_header("content-type", "image/png"),
    )
    .await;
    mount_page(&mock_server, "/ok", html("<p>ok</p>")).await;

    let config = create_test_config(&base_url, vec![], &db_path);
    let mut coordinator = create_coordinator(&config);
    coordinator
        .add_seed_url(&format!("{}/", base_url))
        .await
        .unwrap();

    let summary = coordinator.run(None, false).await.unwrap();
    assert_eq!(summary.crawled, 2);
    assert!(summary.exhausted);

    let storage = coordinator.storage();
    for page in ["/broken", "/logo.png"] {
        let url = storage
            .get_url_by_url(&format!("{}{}", base_url, page))
            .unwrap()
            .unwrap();
        assert_eq!(url.status(), UrlStatus::Attempted, "{}", page);
        assert!(url.visited_at.is_some());
        assert!(url.content.is_none());
    }
}

#[tokio::test]
async fn test_unreachable_host_marks_visited() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("crawl.db");

    // Bind and drop a listener to get a port nothing listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let base_url = format!("http://127.0.0.1:{}", port);

    let config = create_test_config(&base_url, vec![], &db_path);
    let mut coordinator = create_coordinator(&config);
    let seed = coordinator
        .add_seed_url(&format!("{}/", base_url))
        .await
        .unwrap()
        .unwrap();

    assert!(coordinator.crawl_next(false).await.unwrap().is_none());

    let url = coordinator.storage().get_url(seed.id).unwrap();
    assert!(url.visited_at.is_some());
    assert!(url.content.is_none());
    assert!(coordinator.domain_of(&url).unwrap().visited_at.is_some());
}

#[tokio::test]
async fn test_crawl_resumes_across_runs() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("crawl.db");

    mount_robots(&mock_server, "User-agent: *\nDisallow: /admin").await;
    mount_page(
        &mock_server,
        "/",
        html(r#"<a href="/a">a</a><a href="/b">b</a>"#),
    )
    .await;
    mount_page(&mock_server, "/a", html("a")).await;
    mount_page(&mock_server, "/b", html("b")).await;

    let config = create_test_config(&base_url, vec![], &db_path);

    {
        let mut coordinator = create_coordinator(&config);
        coordinator
            .add_seed_url(&format!("{}/", base_url))
            .await
            .unwrap();
        let summary = coordinator.run(Some(1), false).await.unwrap();
        assert_eq!(summary.crawled, 1);
        assert!(!summary.exhausted);
    }

    // A fresh coordinator picks up the persisted frontier and robots rules
    let mut coordinator = create_coordinator(&config);
    let summary = coordinator.run(None, false).await.unwrap();
    assert_eq!(summary.crawled, 2);
    assert!(summary.exhausted);
    assert_eq!(
        coordinator
            .storage()
            .count_urls_by_status(UrlStatus::Unvisited)
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_tightened_filter_with_clean_disallowed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("crawl.db");

    mount_robots(&mock_server, "").await;
    mount_page(&mock_server, "/keep", html("keep")).await;

    let config = create_test_config(&base_url, vec![], &db_path);
    {
        let mut coordinator = create_coordinator(&config);
        coordinator
            .add_seed_url(&format!("{}/drop", base_url))
            .await
            .unwrap();
        coordinator
            .add_seed_url(&format!("{}/keep", base_url))
            .await
            .unwrap();
    }

    // The operator later excludes /drop
    let tightened = create_test_config(
        &base_url,
        vec![format!("{}/drop", regex::escape(&base_url))],
        &db_path,
    );

    let mut coordinator = create_coordinator(&tightened);
    let result = coordinator.crawl_next(false).await;
    assert!(matches!(result, Err(CrawlError::Disallowed { .. })));

    let summary = coordinator.run(None, true).await.unwrap();
    assert_eq!(summary.crawled, 1);

    let storage = coordinator.storage();
    assert!(!storage.url_exists(&format!("{}/drop", base_url)).unwrap());
    assert_eq!(
        storage.count_urls_by_status(UrlStatus::Crawled).unwrap(),
        1
    );
}
