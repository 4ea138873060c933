//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! Parsed rules are cached on each Domain and refreshed once they grow stale.

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::{RobotsRule, RobotsRules, RuleKind};
