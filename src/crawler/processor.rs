//! Single-page processing
//!
//! Fetches one frontier entry, extracts its features, evaluates the rule set
//! matching its role and collects outbound links. The fetch resource opened
//! for a page is closed before `process` returns, whatever the outcome.

use crate::crawler::fetcher::{FetchPage, PageFault, PageFetcher};
use crate::crawler::frontier::FrontierEntry;
use crate::crawler::parser::{parse_html, PageFeatures};
use crate::rules::{collect_issues, run_checks, CheckResults, Finding, RuleEvaluator, RuleSet};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Everything learned from one page
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    /// Normalized URL of the frontier entry
    pub url: String,
    pub features: PageFeatures,
    pub check_results: CheckResults,
    /// Failing and indeterminate findings
    pub findings: Vec<Finding>,
    /// Absolute outbound links in document order
    pub links: Vec<String>,
}

impl PageResult {
    /// Result standing in for a page that faulted
    pub fn empty(url: &str) -> Self {
        Self {
            url: url.to_string(),
            features: PageFeatures {
                url: url.to_string(),
                ..Default::default()
            },
            check_results: CheckResults::new(),
            findings: Vec::new(),
            links: Vec::new(),
        }
    }
}

/// Processes frontier entries for one session
#[derive(Clone)]
pub struct PageProcessor {
    fetcher: Arc<dyn PageFetcher>,
    evaluator: Arc<dyn RuleEvaluator>,
    page_timeout: Duration,
    site_wide: Arc<RuleSet>,
    page_level: Arc<RuleSet>,
}

impl PageProcessor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        evaluator: Arc<dyn RuleEvaluator>,
        page_timeout: Duration,
    ) -> Self {
        Self::with_rule_sets(
            fetcher,
            evaluator,
            page_timeout,
            RuleSet::site_wide(),
            RuleSet::page_level(),
        )
    }

    /// Creates a processor with custom rule sets for root and other pages
    pub fn with_rule_sets(
        fetcher: Arc<dyn PageFetcher>,
        evaluator: Arc<dyn RuleEvaluator>,
        page_timeout: Duration,
        site_wide: RuleSet,
        page_level: RuleSet,
    ) -> Self {
        Self {
            fetcher,
            evaluator,
            page_timeout,
            site_wide: Arc::new(site_wide),
            page_level: Arc::new(page_level),
        }
    }

    /// Processes one entry
    ///
    /// # Returns
    ///
    /// * `Ok(PageResult)` - The page loaded and was evaluated
    /// * `Err(PageFault)` - The page could not be opened, loaded or read
    pub async fn process(&self, entry: &FrontierEntry) -> Result<PageResult, PageFault> {
        let mut page = self.fetcher.open_page().await?;
        let result = self.load_and_evaluate(page.as_mut(), entry).await;
        page.close().await;
        result
    }

    async fn load_and_evaluate(
        &self,
        page: &mut dyn FetchPage,
        entry: &FrontierEntry,
    ) -> Result<PageResult, PageFault> {
        let snapshot = page.navigate(&entry.url, self.page_timeout).await?;

        // Links resolve against the post-redirect location
        let base = Url::parse(&snapshot.final_url)
            .or_else(|_| Url::parse(&entry.url))
            .map_err(|e| PageFault::Extraction(format!("unusable page URL: {}", e)))?;

        let parsed = parse_html(&snapshot.html, &base, &snapshot.headers);
        let mut features = parsed.features;
        features.url = entry.url.clone();

        let rules = if entry.is_root() {
            &self.site_wide
        } else {
            &self.page_level
        };
        let check_results = run_checks(self.evaluator.as_ref(), &features, rules);
        let findings = collect_issues(&check_results);

        tracing::debug!("Found {} issues at {}", findings.len(), entry.url);

        Ok(PageResult {
            url: entry.url.clone(),
            features,
            check_results,
            findings,
            links: parsed.links,
        })
    }
}
