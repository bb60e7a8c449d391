use crate::UrlError;
use url::Url;

/// Query parameters dropped during normalization
const IGNORED_PARAMS: &[&str] = &["utm_source", "utm_medium", "utm_campaign", "sessionid"];

/// Makes a raw link absolute and checks that it parses as a crawlable URL
///
/// Inputs without a `scheme://` prefix are treated as host-relative
/// references and get an `https://` prefix. Scheme names are matched
/// case-insensitively.
///
/// # Arguments
///
/// * `raw` - The URL string as typed by a user or found in a page
///
/// # Returns
///
/// * `Ok(Url)` - Parsed http(s) URL with a host
/// * `Err(UrlError)` - Unparseable input, non-http scheme or missing host
///
/// # Examples
///
/// ```
/// use pinch_crawler::url::ensure_valid_url;
///
/// let url = ensure_valid_url("example.com/about").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/about");
/// ```
pub fn ensure_valid_url(raw: &str) -> Result<Url, UrlError> {
    let raw = raw.trim();
    let formatted = if has_scheme(raw) {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    let url = Url::parse(&formatted).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlError::MissingDomain),
    }
}

/// True when `raw` opens with `scheme://`, where the scheme is a letter
/// followed by letters, digits, `+`, `-` or `.`
fn has_scheme(raw: &str) -> bool {
    let Some((scheme, _)) = raw.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Produces the canonical string form used for dedup and scope checks
///
/// # Normalization Steps
///
/// 1. Make absolute and validate (see [`ensure_valid_url`])
/// 2. Remove fragment
/// 3. Remove `utm_source`, `utm_medium`, `utm_campaign` and `sessionid`,
///    matching keys in any case
/// 4. Lowercase the whole URL
/// 5. Strip trailing slashes
///
/// Applying it to its own output yields the same string.
///
/// # Examples
///
/// ```
/// use pinch_crawler::url::normalize_url;
///
/// let url = normalize_url("https://Example.com/page/?utm_source=x#frag").unwrap();
/// assert_eq!(url, "https://example.com/page");
/// ```
pub fn normalize_url(raw: &str) -> Result<String, UrlError> {
    let mut url = ensure_valid_url(raw)?;
    url.set_fragment(None);

    if url.query().is_some() {
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let kept: Vec<&(String, String)> = pairs
            .iter()
            .filter(|(k, _)| !IGNORED_PARAMS.contains(&k.to_ascii_lowercase().as_str()))
            .collect();

        // Only re-serialize when something was removed so untouched
        // queries keep their original encoding.
        if kept.len() != pairs.len() {
            if kept.is_empty() {
                url.set_query(None);
            } else {
                url.query_pairs_mut()
                    .clear()
                    .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            }
        } else if pairs.is_empty() {
            url.set_query(None);
        }
    }

    let lowered = url.as_str().to_lowercase();
    Ok(lowered.trim_end_matches('/').to_string())
}
