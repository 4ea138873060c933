//! Statistics generation from crawl database
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::state::UrlStatus;
use crate::storage::{Storage, StorageResult};
use std::collections::HashMap;

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Total number of urls known
    pub total_urls: u64,

    /// Count of urls by status
    pub urls_by_status: HashMap<UrlStatus, u64>,

    /// Number of domains encountered
    pub total_domains: u64,

    /// Domains crawled at least once
    pub visited_domains: u64,

    /// Total number of edges in the link graph
    pub total_links: u64,
}

impl CrawlStatistics {
    pub fn count(&self, status: UrlStatus) -> u64 {
        self.urls_by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn Storage) -> StorageResult<CrawlStatistics> {
    let mut urls_by_status = HashMap::new();
    for status in [UrlStatus::Unvisited, UrlStatus::Crawled, UrlStatus::Attempted] {
        urls_by_status.insert(status, storage.count_urls_by_status(status)?);
    }

    Ok(CrawlStatistics {
        total_urls: storage.count_urls()?,
        urls_by_status,
        total_domains: storage.count_domains()?,
        visited_domains: storage.count_visited_domains()?,
        total_links: storage.count_links()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Total urls: {}", stats.total_urls);
    println!(
        "  Domains: {} ({} visited)",
        stats.total_domains, stats.visited_domains
    );
    println!("  Total links: {}", stats.total_links);
    println!();

    println!("Urls by Status:");
    for status in [UrlStatus::Crawled, UrlStatus::Attempted, UrlStatus::Unvisited] {
        let count = stats.count(status);
        let percentage = if stats.total_urls > 0 {
            (count as f64 / stats.total_urls as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
}
