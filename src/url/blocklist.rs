/// Substrings that mark a link as an account, commerce or tracking page
pub const BLOCKED_KEYWORDS: &[&str] = &[
    "login",
    "signin",
    "logout",
    "signup",
    "register",
    "account",
    "auth",
    "sessionid=",
    "cart",
    "checkout",
    "password",
    "track",
    "order",
    "wishlist",
    "add-to-cart",
    "preferences",
    "settings",
    "help",
    "support",
    "feedback",
    "subscribe",
    "utm_",
];

/// Returns the first blocked keyword contained in a normalized URL
///
/// Matching is a plain substring test, so `/orders` and `/border` both hit
/// `order`.
pub fn blocked_keyword(normalized_url: &str) -> Option<&'static str> {
    let lowered = normalized_url.to_lowercase();
    BLOCKED_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| lowered.contains(keyword))
}

/// Returns true if the URL should never be enqueued from a page link
pub fn is_blocked(normalized_url: &str) -> bool {
    blocked_keyword(normalized_url).is_some()
}
