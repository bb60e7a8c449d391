//! Crawl frontier for one session
//!
//! This module handles:
//! - The FIFO queue of discovered-but-unvisited URLs
//! - The append-only visited set backing deduplication
//! - Scope, keyword and depth filters applied on enqueue
//!
//! The frontier does no I/O. Every URL is normalized before it is compared,
//! so the visited set never holds two spellings of the same page.

use crate::url::{blocked_keyword, ensure_valid_url, normalize_url, url_root_domain};
use std::collections::{HashSet, VecDeque};

/// A URL accepted into the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Normalized URL, also the dedup key
    pub url: String,

    /// Link distance from the root page
    pub depth: u32,

    /// Position in discovery order, starting at 0 for the root
    pub order: u64,

    /// Normalized URL of the page the link was found on
    pub discovered_from: Option<String>,
}

impl FrontierEntry {
    pub fn is_root(&self) -> bool {
        self.order == 0
    }
}

/// Why an enqueue was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Invalid,
    AlreadySeen,
    OutOfScope(String),
    BlockedKeyword(&'static str),
    TooDeep,
}

/// Result of an enqueue attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    Skipped(SkipReason),
}

impl EnqueueOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued)
    }
}

/// Discovered URLs for one crawl session
#[derive(Debug)]
pub struct Frontier {
    scope_domain: String,
    depth_budget: Option<u32>,
    visited: HashSet<String>,
    pending: VecDeque<FrontierEntry>,
    next_order: u64,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `scope_domain` - Apex domain every accepted URL must share
    /// * `depth_budget` - Deepest link distance to accept, if bounded
    pub fn new(scope_domain: impl Into<String>, depth_budget: Option<u32>) -> Self {
        Self {
            scope_domain: scope_domain.into().to_lowercase(),
            depth_budget,
            visited: HashSet::new(),
            pending: VecDeque::new(),
            next_order: 0,
        }
    }

    pub fn scope_domain(&self) -> &str {
        &self.scope_domain
    }

    /// Enqueues the session's root URL at depth 0
    ///
    /// The keyword filter is not applied: the root was asked for explicitly.
    pub fn seed(&mut self, root: &str) -> EnqueueOutcome {
        self.admit(root, 0, None, false)
    }

    /// Enqueues a discovered link
    ///
    /// Drops the link (never errors) when it fails validation, was already
    /// seen, leaves the scope domain, contains a blocked keyword or exceeds
    /// the depth budget. Checks run in that order.
    pub fn enqueue(&mut self, url: &str, depth: u32, discovered_from: Option<&str>) -> EnqueueOutcome {
        self.admit(url, depth, discovered_from, true)
    }

    fn admit(
        &mut self,
        url: &str,
        depth: u32,
        discovered_from: Option<&str>,
        keyword_filter: bool,
    ) -> EnqueueOutcome {
        let parsed = match ensure_valid_url(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::trace!("Dropping invalid URL {}: {}", url, e);
                return EnqueueOutcome::Skipped(SkipReason::Invalid);
            }
        };

        let normalized = match normalize_url(parsed.as_str()) {
            Ok(normalized) => normalized,
            Err(_) => return EnqueueOutcome::Skipped(SkipReason::Invalid),
        };

        if self.visited.contains(&normalized) {
            return EnqueueOutcome::Skipped(SkipReason::AlreadySeen);
        }

        let Some(domain) = url_root_domain(&parsed) else {
            return EnqueueOutcome::Skipped(SkipReason::Invalid);
        };
        if domain != self.scope_domain {
            tracing::trace!("Dropping {} (domain {} out of scope)", normalized, domain);
            return EnqueueOutcome::Skipped(SkipReason::OutOfScope(domain));
        }

        if keyword_filter {
            if let Some(keyword) = blocked_keyword(&normalized) {
                tracing::trace!("Dropping {} (blocked keyword '{}')", normalized, keyword);
                return EnqueueOutcome::Skipped(SkipReason::BlockedKeyword(keyword));
            }
        }

        if let Some(max) = self.depth_budget {
            if depth > max {
                return EnqueueOutcome::Skipped(SkipReason::TooDeep);
            }
        }

        self.visited.insert(normalized.clone());
        self.pending.push_back(FrontierEntry {
            url: normalized,
            depth,
            order: self.next_order,
            discovered_from: discovered_from.map(str::to_string),
        });
        self.next_order += 1;

        EnqueueOutcome::Queued
    }

    /// Removes and returns the earliest pending entry
    pub fn dequeue(&mut self) -> Option<FrontierEntry> {
        self.pending.pop_front()
    }

    /// True while more pages may be visited
    pub fn has_capacity(visited: u32, page_budget: u32) -> bool {
        visited < page_budget
    }

    /// Number of pending entries
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of URLs ever accepted
    pub fn seen_count(&self) -> usize {
        self.visited.len()
    }

    pub fn has_seen(&self, normalized: &str) -> bool {
        self.visited.contains(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frontier() -> Frontier {
        let mut f = Frontier::new("site.test", None);
        assert!(f.seed("https://site.test/").is_queued());
        f
    }

    #[test]
    fn test_seed_normalizes_root() {
        let mut f = frontier();
        let root = f.dequeue().unwrap();
        assert_eq!(root.url, "https://site.test");
        assert_eq!(root.depth, 0);
        assert!(root.is_root());
        assert!(f.dequeue().is_none());
    }

    #[test]
    fn test_fifo_order() {
        let mut f = frontier();
        f.enqueue("https://site.test/a", 1, Some("https://site.test"));
        f.enqueue("https://site.test/b", 1, Some("https://site.test"));

        let urls: Vec<String> = std::iter::from_fn(|| f.dequeue()).map(|e| e.url).collect();
        assert_eq!(
            urls,
            vec!["https://site.test", "https://site.test/a", "https://site.test/b"]
        );
    }

    #[test]
    fn test_dedup_on_normalized_form() {
        let mut f = frontier();
        assert!(f.enqueue("https://site.test/a", 1, None).is_queued());
        assert_eq!(
            f.enqueue("https://SITE.test/a/?utm_source=x#top", 1, None),
            EnqueueOutcome::Skipped(SkipReason::AlreadySeen)
        );
        // Dequeued URLs stay in the visited set
        while f.dequeue().is_some() {}
        assert_eq!(
            f.enqueue("https://site.test/a", 2, None),
            EnqueueOutcome::Skipped(SkipReason::AlreadySeen)
        );
        assert_eq!(f.seen_count(), 2);
    }

    #[test]
    fn test_subdomains_share_scope() {
        let mut f = frontier();
        assert!(f.enqueue("https://blog.site.test/post", 1, None).is_queued());
        assert_eq!(
            f.enqueue("https://other.test/", 1, None),
            EnqueueOutcome::Skipped(SkipReason::OutOfScope("other.test".to_string()))
        );
    }

    #[test]
    fn test_blocked_keywords_never_enqueued() {
        let mut f = frontier();
        assert_eq!(
            f.enqueue("https://site.test/checkout", 1, None),
            EnqueueOutcome::Skipped(SkipReason::BlockedKeyword("checkout"))
        );
        assert!(matches!(
            f.enqueue("https://site.test/page?utm_term=x", 1, None),
            EnqueueOutcome::Skipped(SkipReason::BlockedKeyword(_))
        ));
        assert!(!f.has_seen("https://site.test/checkout"));
    }

    #[test]
    fn test_root_skips_keyword_filter() {
        let mut f = Frontier::new("site.test", None);
        assert!(f.seed("https://site.test/help").is_queued());
    }

    #[test]
    fn test_invalid_urls_are_dropped() {
        let mut f = frontier();
        assert_eq!(
            f.enqueue("httpx://site.test/a", 1, None),
            EnqueueOutcome::Skipped(SkipReason::Invalid)
        );
        assert_eq!(f.len(), 1);
    }

    #[test]
    fn test_depth_budget() {
        let mut f = Frontier::new("site.test", Some(1));
        f.seed("https://site.test");
        assert!(f.enqueue("https://site.test/a", 1, None).is_queued());
        assert_eq!(
            f.enqueue("https://site.test/a/b", 2, None),
            EnqueueOutcome::Skipped(SkipReason::TooDeep)
        );
    }

    #[test]
    fn test_discovery_metadata() {
        let mut f = frontier();
        f.enqueue("https://site.test/a", 1, Some("https://site.test"));
        f.dequeue();
        let entry = f.dequeue().unwrap();
        assert_eq!(entry.order, 1);
        assert_eq!(entry.discovered_from.as_deref(), Some("https://site.test"));
        assert!(!entry.is_root());
    }

    #[test]
    fn test_has_capacity() {
        assert!(Frontier::has_capacity(0, 2));
        assert!(Frontier::has_capacity(1, 2));
        assert!(!Frontier::has_capacity(2, 2));
        assert!(!Frontier::has_capacity(0, 0));
    }
}
