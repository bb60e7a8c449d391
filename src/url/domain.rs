use url::Url;

/// Extracts the lowercase host from a URL
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Reduces a hostname to its apex domain
///
/// Keeps the last two dot-separated labels. Hosts under multi-label public
/// suffixes are not special-cased, so `shop.example.co.uk` and
/// `blog.other.co.uk` both reduce to `co.uk` and count as the same scope.
///
/// # Examples
///
/// ```
/// use pinch_crawler::url::root_domain;
///
/// assert_eq!(root_domain("blog.example.com"), "example.com");
/// assert_eq!(root_domain("example.com"), "example.com");
/// ```
pub fn root_domain(host: &str) -> String {
    let host = host.to_lowercase();
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host;
    }
    labels[labels.len() - 2..].join(".")
}

/// Apex domain of a parsed URL, if it has a host
pub fn url_root_domain(url: &Url) -> Option<String> {
    extract_domain(url).map(|host| root_domain(&host))
}
