use sha2::{Digest, Sha256};

/// Computes the lookup fingerprint of a URL string
///
/// The fingerprint is the hex-encoded SHA-256 of the exact URL bytes. It is a
/// compact unique index for existence checks, not a content hash.
///
/// # Examples
///
/// ```
/// use webcrawler::url::fingerprint;
///
/// let a = fingerprint("https://example.com/");
/// assert_eq!(a.len(), 64);
/// assert_eq!(a, fingerprint("https://example.com/"));
/// assert_ne!(a, fingerprint("https://example.com"));
/// ```
pub fn fingerprint(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
