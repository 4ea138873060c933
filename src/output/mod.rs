//! Output module for reporting crawl state
//!
//! This module handles reading crawl statistics back out of storage and
//! printing them for the operator.

pub mod stats;

pub use stats::{load_statistics, print_statistics, CrawlStatistics};
