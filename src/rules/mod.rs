//! Rule evaluation for extracted page features
//!
//! Checks are addressed by display name and grouped into categories. A
//! [`RuleSet`] picks which checks run for a page; a [`RuleEvaluator`]
//! answers each one.
//!
//! # Example
//!
//! ```
//! use pinch_crawler::crawler::PageFeatures;
//! use pinch_crawler::rules::{run_checks, CheckRegistry, RuleSet};
//!
//! let features = PageFeatures {
//!     title: Some("Home".to_string()),
//!     ..Default::default()
//! };
//! let results = run_checks(&CheckRegistry::with_defaults(), &features, &RuleSet::page_level());
//! assert!(results.contains_key("On-Page SEO Results"));
//! ```

mod registry;
mod suggestions;

pub use registry::{CheckFn, CheckRegistry};
pub use suggestions::suggestion_for;

use crate::crawler::PageFeatures;
use serde::Serialize;
use std::collections::BTreeMap;

/// Three-valued result of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Pass,
    Fail,
    /// The check is unknown or the page lacks the signal it needs
    Indeterminate,
}

impl CheckOutcome {
    /// Wire form of the outcome (`true`, `false` or `null`)
    pub fn as_pass(&self) -> Option<bool> {
        match self {
            Self::Pass => Some(true),
            Self::Fail => Some(false),
            Self::Indeterminate => None,
        }
    }
}

impl From<Option<bool>> for CheckOutcome {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Pass,
            Some(false) => Self::Fail,
            None => Self::Indeterminate,
        }
    }
}

/// Evaluates named checks against page features
pub trait RuleEvaluator: Send + Sync {
    fn evaluate(&self, check: &str, features: &PageFeatures) -> CheckOutcome;

    /// Advice shown when a check does not pass
    fn suggestion(&self, category: &str, check: &str) -> String;
}

/// Result of one check on one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub check: String,
    pub pass: Option<bool>,
    pub suggestion: String,
    pub category: String,
}

impl Finding {
    pub fn new(
        check: impl Into<String>,
        category: impl Into<String>,
        pass: Option<bool>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            check: check.into(),
            pass,
            suggestion: suggestion.into(),
            category: category.into(),
        }
    }

    /// Failing and indeterminate findings are both reported as issues
    pub fn is_issue(&self) -> bool {
        self.pass != Some(true)
    }
}

/// Findings grouped by category
pub type CheckResults = BTreeMap<String, Vec<Finding>>;

/// Which checks to run, grouped by category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    categories: Vec<(String, Vec<String>)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self {
            categories: Vec::new(),
        }
    }

    /// Adds a category and its checks
    pub fn with_category(mut self, category: &str, checks: &[&str]) -> Self {
        self.categories.push((
            category.to_string(),
            checks.iter().map(|c| c.to_string()).collect(),
        ));
        self
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|(name, checks)| (name.as_str(), checks.as_slice()))
    }

    pub fn check_count(&self) -> usize {
        self.categories.iter().map(|(_, checks)| checks.len()).sum()
    }

    /// Checks applied to the root page of a crawl
    ///
    /// Covers every category the extractor collects signals for.
    pub fn site_wide() -> Self {
        Self::new()
            .with_category("On-Page SEO Results", ON_PAGE_SITE_WIDE)
            .with_category(
                "Local SEO Results",
                &[
                    "Address & Phone Shown on Website",
                    "Local Business Schema",
                    "Google Business Profile Identified",
                    "Google Business Profile Completeness",
                ],
            )
            .with_category("Technology Results", &["Charset", "Web server"])
            .with_category("Links", &["On-Page Links", "Friendly Links"])
            .with_category(
                "Usability Results",
                &[
                    "Device Rendering",
                    "Use of Mobile Viewports",
                    "Flash Used?",
                    "iFrames Used?",
                    "Favicon",
                ],
            )
            .with_category(
                "Performance Results",
                &[
                    "Download Page Size",
                    "Number of Objects Loaded",
                    "Google Accelerated Mobile Pages (AMP)",
                    "Deprecated HTML",
                    "Inline Styles",
                ],
            )
            .with_category(
                "Social Results",
                &[
                    "Facebook Page Linked",
                    "X (Formerly Twitter) Account Linked",
                    "X Cards",
                    "Instagram Linked",
                    "YouTube Channel Linked",
                    "LinkedIn Page Linked",
                ],
            )
    }

    /// Checks applied to every non-root page
    pub fn page_level() -> Self {
        Self::new().with_category("On-Page SEO Results", ON_PAGE_PER_PAGE)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}

const ON_PAGE_SITE_WIDE: &[&str] = &[
    "Title Tag",
    "Meta Description Tag",
    "SERP Snippet Preview",
    "Hreflang Tag",
    "Lang attribute in Header Tag",
    "H1 Header Tag Usage",
    "H2-H6 Header Tag Usage",
    "Amount of Content",
    "Image Alt Attributes",
    "Canonical Tag",
    "Noindex Tag Test",
    "Noindex Header Test",
    "SSL Enabled",
    "XML Sitemaps",
    "Analytics",
];

const ON_PAGE_PER_PAGE: &[&str] = &[
    "Title Tag",
    "Meta Description Tag",
    "H1 Header Tag Usage",
    "H2-H6 Header Tag Usage",
    "Amount of Content",
    "Image Alt Attributes",
    "Canonical Tag",
    "Noindex Tag Test",
    "Noindex Header Test",
    "SSL Enabled",
];

/// Runs every check in `rules` and groups the findings by category
///
/// Passing checks carry an empty suggestion.
pub fn run_checks(
    evaluator: &dyn RuleEvaluator,
    features: &PageFeatures,
    rules: &RuleSet,
) -> CheckResults {
    let mut results = CheckResults::new();

    for (category, checks) in rules.categories() {
        let findings = checks
            .iter()
            .map(|check| {
                let outcome = evaluator.evaluate(check, features);
                let suggestion = match outcome {
                    CheckOutcome::Pass => String::new(),
                    _ => evaluator.suggestion(category, check),
                };
                Finding::new(check.as_str(), category, outcome.as_pass(), suggestion)
            })
            .collect();
        results.insert(category.to_string(), findings);
    }

    results
}

/// Flattens check results into the list of issues
pub fn collect_issues(results: &CheckResults) -> Vec<Finding> {
    results
        .values()
        .flatten()
        .filter(|finding| finding.is_issue())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEvaluator;

    impl RuleEvaluator for FixedEvaluator {
        fn evaluate(&self, check: &str, _features: &PageFeatures) -> CheckOutcome {
            match check {
                "good" => CheckOutcome::Pass,
                "bad" => CheckOutcome::Fail,
                _ => CheckOutcome::Indeterminate,
            }
        }

        fn suggestion(&self, _category: &str, check: &str) -> String {
            format!("fix {}", check)
        }
    }

    #[test]
    fn test_run_checks_groups_by_category() {
        let rules = RuleSet::new()
            .with_category("A", &["good", "bad"])
            .with_category("B", &["mystery"]);
        let results = run_checks(&FixedEvaluator, &PageFeatures::default(), &rules);

        assert_eq!(results.len(), 2);
        assert_eq!(results["A"][0].pass, Some(true));
        assert_eq!(results["A"][0].suggestion, "");
        assert_eq!(results["A"][1].pass, Some(false));
        assert_eq!(results["A"][1].suggestion, "fix bad");
        assert_eq!(results["B"][0].pass, None);
        assert_eq!(results["B"][0].category, "B");
    }

    #[test]
    fn test_issues_include_indeterminate() {
        let rules = RuleSet::new().with_category("A", &["good", "bad", "mystery"]);
        let results = run_checks(&FixedEvaluator, &PageFeatures::default(), &rules);
        let issues = collect_issues(&results);

        let names: Vec<&str> = issues.iter().map(|f| f.check.as_str()).collect();
        assert_eq!(names, vec!["bad", "mystery"]);
    }

    #[test]
    fn test_finding_wire_shape() {
        let finding = Finding::new("Title Tag", "On-Page SEO Results", None, "Add one");
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "check": "Title Tag",
                "pass": null,
                "suggestion": "Add one",
                "category": "On-Page SEO Results"
            })
        );
    }

    #[test]
    fn test_default_sets_only_use_registered_checks() {
        let registry = CheckRegistry::with_defaults();
        for rules in [RuleSet::site_wide(), RuleSet::page_level()] {
            for (_, checks) in rules.categories() {
                for check in checks {
                    assert!(registry.contains(check), "unregistered check {}", check);
                }
            }
        }
        assert!(RuleSet::site_wide().check_count() > RuleSet::page_level().check_count());
    }

    #[test]
    fn test_default_sets_have_suggestions() {
        for rules in [RuleSet::site_wide(), RuleSet::page_level()] {
            for (category, checks) in rules.categories() {
                for check in checks {
                    let text = suggestion_for(category, check);
                    assert!(!text.starts_with("No suggestion"), "{} / {}", category, check);
                }
            }
        }
    }
}
