use crate::UrlError;
use url::Url;

/// Longest URL string the crawl state will hold
pub const MAX_URL_LENGTH: usize = 5000;

/// Resolves a discovered href against the page it was found on
///
/// # Resolution Rules
///
/// 1. Surrounding whitespace is trimmed
/// 2. A missing scheme is inherited from `base` (`//host/path`)
/// 3. A missing authority is inherited from `base` (`/path`, `path`, `../path`)
/// 4. The fragment is dropped, so same-page anchors collapse onto the page
///
/// Schemes are not filtered here: `mailto:` and friends come back as-is and
/// the caller applies the URL filter and scheme allow-list.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use webcrawler::url::normalize_link;
///
/// let base = Url::parse("https://example.com/x").unwrap();
/// let url = normalize_link("/page", &base).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
/// ```
pub fn normalize_link(raw_href: &str, base: &Url) -> Result<Url, UrlError> {
    let mut url = base
        .join(raw_href.trim())
        .map_err(|e| UrlError::Parse(format!("{}: {}", raw_href, e)))?;
    url.set_fragment(None);
    Ok(url)
}

/// Parses an operator-supplied absolute URL
///
/// Rejects relative references, host-less URLs and anything longer than
/// [`MAX_URL_LENGTH`].
pub fn parse_absolute(url_str: &str) -> Result<Url, UrlError> {
    let url_str = url_str.trim();
    if url_str.len() > MAX_URL_LENGTH {
        return Err(UrlError::TooLong {
            len: url_str.len(),
            max: MAX_URL_LENGTH,
        });
    }

    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(format!("{}: {}", url_str, e)))?;
    if url.host_str().is_none() {
        return Err(UrlError::MissingHost(url_str.to_string()));
    }

    Ok(url)
}
