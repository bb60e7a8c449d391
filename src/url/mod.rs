//! URL handling module
//!
//! This module provides URL validation, normalization, apex-domain
//! extraction and the keyword blocklist used to keep a crawl on content
//! pages.

mod blocklist;
mod domain;
mod normalize;

pub use blocklist::{blocked_keyword, is_blocked, BLOCKED_KEYWORDS};
pub use domain::{extract_domain, root_domain, url_root_domain};
pub use normalize::{ensure_valid_url, normalize_url};

/// Returns true if `url` lies inside the scope of `scope_domain`
///
/// # Arguments
///
/// * `url` - A normalized URL string
/// * `scope_domain` - Apex domain of the session root
pub fn in_scope(url: &str, scope_domain: &str) -> bool {
    ::url::Url::parse(url)
        .ok()
        .and_then(|u| url_root_domain(&u))
        .map(|apex| apex == scope_domain)
        .unwrap_or(false)
}
