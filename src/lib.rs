//! webcrawler: a polite, stateful web crawler
//!
//! This crate repeatedly picks the next URL to visit from a persistent
//! frontier, fetches it, records the outgoing link graph and schedules
//! re-visits, while honoring robots.txt and operator allow/deny filters.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Top-level error type used by the command-line interface
#[derive(Debug, Error)]
pub enum WebcrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Outcome of a failed crawl attempt or seed ingestion
///
/// The first four variants are the crawl taxonomy: `Disallowed` is an
/// operator-filter rejection, the other three are recoverable and only
/// deprioritize the Url. The remaining variants are infrastructure failures
/// that always propagate out of the retry loop.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Crawling this URL is not allowed: {url}")]
    Disallowed { url: String },

    #[error("URL disallowed by robots.txt: {url}")]
    DisallowedByRobots { url: String },

    #[error("Unable to connect to {url}: {reason}")]
    UnableToConnect { url: String, reason: String },

    #[error("Content type \"{content_type}\" is not supported for {url}")]
    UnsupportedContentType { url: String, content_type: String },

    #[error("URL {url} does not belong to domain {hostname}")]
    DomainMismatch { url: String, hostname: String },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),
}

impl CrawlError {
    /// Returns true for outcomes that only deprioritize the Url
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DisallowedByRobots { .. }
                | Self::UnableToConnect { .. }
                | Self::UnsupportedContentType { .. }
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),

    #[error("URL exceeds {max} characters: {len}")]
    TooLong { len: usize, max: usize },
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::Coordinator;
pub use state::{Domain, UrlRecord, UrlStatus};
pub use crate::url::{fingerprint, normalize_link, UrlFilter};
