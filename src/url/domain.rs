use url::Url;

/// Extracts the authority (host and non-default port) that identifies a Domain
///
/// The host is lowercased; user info is never part of the authority. Returns
/// None for URLs without a host, such as `mailto:` links.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use webcrawler::url::authority;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(authority(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://localhost:8080/").unwrap();
/// assert_eq!(authority(&url), Some("localhost:8080".to_string()));
/// ```
pub fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Only plain web schemes are ever fetched
pub fn is_supported_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Builds the well-known robots.txt location for a hostname
pub fn robots_txt_url(scheme: &str, hostname: &str) -> String {
    format!("{}://{}/robots.txt", scheme, hostname)
}
