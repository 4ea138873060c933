//! Crawl state entities
//!
//! # Components
//!
//! - `Domain`: one crawled host, its visit time and cached robots.txt rules
//! - `UrlRecord`: one crawl target, its visit time and fetched content
//! - `UrlStatus`: the visited/unvisited/attempted state derived from a `UrlRecord`

mod domain_state;
mod page_state;

// Re-export main types
pub use domain_state::Domain;
pub use page_state::{UrlRecord, UrlStatus};
