//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::{Domain, UrlRecord, UrlStatus};
use crate::storage::LinkRecord;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    #[error("Url not found: {0}")]
    UrlNotFound(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every update touches only the named fields, so concurrent writers never
/// overwrite each other's columns with stale in-memory copies. Upserts rely on
/// unique constraints rather than check-then-insert.
pub trait Storage {
    // ===== Domains =====

    /// Returns the domain for `hostname`, creating it if needed
    fn upsert_domain(&mut self, hostname: &str) -> StorageResult<Domain>;

    /// Gets a domain by ID
    fn get_domain(&self, domain_id: i64) -> StorageResult<Domain>;

    /// Gets a domain by hostname
    fn get_domain_by_hostname(&self, hostname: &str) -> StorageResult<Option<Domain>>;

    /// Sets `visited_at` on a domain
    fn set_domain_visited(&mut self, domain_id: i64, at: DateTime<Utc>) -> StorageResult<()>;

    /// Stores freshly acquired robots.txt rules and their acquisition time
    fn set_domain_robots(
        &mut self,
        domain_id: i64,
        robots_txt: &str,
        at: DateTime<Utc>,
    ) -> StorageResult<()>;

    // ===== Urls =====

    /// Returns the record for `url`, creating an unvisited one if needed
    ///
    /// The boolean is true when the record was created by this call.
    fn upsert_url(&mut self, url: &str, domain_id: i64) -> StorageResult<(UrlRecord, bool)>;

    /// Gets a url by ID
    fn get_url(&self, url_id: i64) -> StorageResult<UrlRecord>;

    /// Gets a url by its exact string, through the fingerprint index
    fn get_url_by_url(&self, url: &str) -> StorageResult<Option<UrlRecord>>;

    /// Checks existence through the fingerprint index
    fn url_exists(&self, url: &str) -> StorageResult<bool>;

    /// Permanently deletes a url and every edge touching it
    fn delete_url(&mut self, url_id: i64) -> StorageResult<()>;

    /// Sets `visited_at` on a url without touching its content
    fn set_url_visited(&mut self, url_id: i64, at: DateTime<Utc>) -> StorageResult<()>;

    /// Stores fetched content and sets `visited_at`
    fn set_url_content(
        &mut self,
        url_id: i64,
        content: &str,
        at: DateTime<Utc>,
    ) -> StorageResult<()>;

    // ===== Link Graph =====

    /// Adds a directed edge; returns false if it already existed
    fn insert_link(&mut self, from_url_id: i64, to_url_id: i64) -> StorageResult<bool>;

    /// Gets all outgoing links from a url
    fn get_outgoing_links(&self, url_id: i64) -> StorageResult<Vec<LinkRecord>>;

    /// Gets all incoming links to a url
    fn get_incoming_links(&self, url_id: i64) -> StorageResult<Vec<LinkRecord>>;

    /// Counts the total number of links
    fn count_links(&self) -> StorageResult<u64>;

    // ===== Frontier Queries =====

    /// First unvisited url on a never-visited domain, in creation order
    fn next_url_on_unvisited_domain(&self) -> StorageResult<Option<UrlRecord>>;

    /// First unvisited url, preferring domains visited longest ago
    fn next_unvisited_url(&self) -> StorageResult<Option<UrlRecord>>;

    /// Stalest url visited before `cutoff`, ties broken by domain visit time
    fn next_stale_url(&self, cutoff: DateTime<Utc>) -> StorageResult<Option<UrlRecord>>;

    // ===== Statistics =====

    /// Gets total domain count
    fn count_domains(&self) -> StorageResult<u64>;

    /// Counts domains that have been crawled at least once
    fn count_visited_domains(&self) -> StorageResult<u64>;

    /// Gets total url count
    fn count_urls(&self) -> StorageResult<u64>;

    /// Counts urls by derived status
    fn count_urls_by_status(&self, status: UrlStatus) -> StorageResult<u64>;
}
