//! HTML parser for extracting links
//!
//! Only anchor hrefs are extracted. Resolution, filtering and scheme checks
//! happen in the coordinator so that every href goes through the same policy.

use scraper::{Html, Selector};

/// Pulls raw link targets out of a fetched document
pub trait LinkExtractor: Send + Sync {
    /// Returns every href value in document order, unmodified
    fn extract_hrefs(&self, html: &str) -> Vec<String>;
}

/// [`LinkExtractor`] for HTML documents, using `a[href]`
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    /// # Example
    ///
    /// ```
    /// use webcrawler::crawler::{HtmlLinkExtractor, LinkExtractor};
    ///
    /// let html = r#"<html><body><a href="/page">Link</a></body></html>"#;
    /// assert_eq!(HtmlLinkExtractor.extract_hrefs(html), vec!["/page".to_string()]);
    /// ```
    fn extract_hrefs(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        let Ok(selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        document
            .select(&selector)
            .filter_map(|element| element.value().attr("href"))
            .map(str::to_string)
            .collect()
    }
}
