//! URL handling module
//!
//! This module provides the operator allow/deny filter, link normalization,
//! authority extraction and URL fingerprinting.

mod domain;
mod filter;
mod fingerprint;
mod normalize;

// Re-export main functions
pub use domain::{authority, is_supported_scheme, robots_txt_url};
pub use filter::UrlFilter;
pub use fingerprint::fingerprint;
pub use normalize::{normalize_link, parse_absolute, MAX_URL_LENGTH};
