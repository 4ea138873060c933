use crate::config::UrlPatternConfig;
use crate::ConfigError;
use regex::Regex;

/// Operator-supplied allow/deny policy for candidate URLs
///
/// Patterns are regular expressions anchored at the start of the URL string,
/// so a plain prefix such as `https://example\.com/` behaves as a prefix match.
#[derive(Debug, Clone)]
pub struct UrlFilter {
    allowed: Vec<Regex>,
    disallowed: Vec<Regex>,
}

impl UrlFilter {
    /// Compiles the allow and deny lists, preserving their order
    pub fn new<A, D>(allowed: A, disallowed: D) -> Result<Self, ConfigError>
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        Ok(Self {
            allowed: compile_patterns(allowed)?,
            disallowed: compile_patterns(disallowed)?,
        })
    }

    pub fn from_config(config: &UrlPatternConfig) -> Result<Self, ConfigError> {
        Self::new(&config.allowed, &config.disallowed)
    }

    /// Checks a URL against the deny list first, then the allow list
    ///
    /// Anything not explicitly allowed is rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use webcrawler::url::UrlFilter;
    ///
    /// let filter = UrlFilter::new(["https://example\\.com/"], ["https://example\\.com/admin"]).unwrap();
    /// assert!(filter.is_crawlable("https://example.com/page"));
    /// assert!(!filter.is_crawlable("https://example.com/admin/users"));
    /// assert!(!filter.is_crawlable("https://other.com/"));
    /// ```
    pub fn is_crawlable(&self, url: &str) -> bool {
        if self.disallowed.iter().any(|re| re.is_match(url)) {
            return false;
        }
        self.allowed.iter().any(|re| re.is_match(url))
    }
}

fn compile_patterns<I>(patterns: I) -> Result<Vec<Regex>, ConfigError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|pattern| {
            let pattern = pattern.as_ref();
            Regex::new(&format!("^(?:{})", pattern))
                .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))
        })
        .collect()
}
