//! Name-keyed check table
//!
//! Each check reads the extracted [`PageFeatures`] and answers pass, fail or
//! `None` when the signal it needs was never collected.

use crate::crawler::PageFeatures;
use crate::rules::suggestions::suggestion_for;
use crate::rules::{CheckOutcome, RuleEvaluator};
use std::collections::HashMap;

/// Signature of a single check
pub type CheckFn = fn(&PageFeatures) -> Option<bool>;

/// Registry of checks addressable by display name
pub struct CheckRegistry {
    checks: HashMap<&'static str, CheckFn>,
}

impl CheckRegistry {
    /// Creates an empty registry
    pub fn empty() -> Self {
        Self {
            checks: HashMap::new(),
        }
    }

    /// Creates a registry holding the full built-in check table
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        register_builtins(&mut registry);
        registry
    }

    /// Adds or replaces a check
    pub fn register(&mut self, name: &'static str, check: CheckFn) {
        self.checks.insert(name, check);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.checks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl RuleEvaluator for CheckRegistry {
    fn evaluate(&self, check: &str, features: &PageFeatures) -> CheckOutcome {
        match self.checks.get(check) {
            Some(f) => CheckOutcome::from(f(features)),
            None => {
                tracing::trace!("Unknown check '{}'", check);
                CheckOutcome::Indeterminate
            }
        }
    }

    fn suggestion(&self, category: &str, check: &str) -> String {
        suggestion_for(category, check)
    }
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// Case-insensitive keyword containment; `None` without a target keyword
fn keyword_in(features: &PageFeatures, haystack: Option<&str>) -> Option<bool> {
    let keyword = features.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
    Some(
        haystack
            .map(|h| h.to_lowercase().contains(&keyword.to_lowercase()))
            .unwrap_or(false),
    )
}

fn not_collected(_: &PageFeatures) -> Option<bool> {
    None
}

fn register_builtins(r: &mut CheckRegistry) {
    // On-page
    r.register("Title Tag", |f| Some(non_empty(&f.title)));
    r.register("Target Keyword in Title Tag", |f| keyword_in(f, f.title.as_deref()));
    r.register("Meta Description Tag", |f| Some(non_empty(&f.meta_description)));
    r.register("Target Keyword in Meta Description Tag", |f| {
        keyword_in(f, f.meta_description.as_deref())
    });
    r.register("SERP Snippet Preview", |f| {
        Some(non_empty(&f.title) && non_empty(&f.meta_description))
    });
    r.register("Hreflang Tag", |f| Some(f.hreflang));
    r.register("Lang attribute in Header Tag", |f| Some(non_empty(&f.lang_attr)));
    r.register("H1 Header Tag Usage", |f| Some(non_empty(&f.h1)));
    r.register("Target Keyword in H1", |f| keyword_in(f, f.h1.as_deref()));
    r.register("H2-H6 Header Tag Usage", |f| Some(f.h2toh6_count > 0));
    r.register("Keyword Consistency", |f| keyword_in(f, Some(&f.keyword_usage)));
    r.register("Amount of Content", |f| Some(f.keyword_usage.chars().count() > 500));
    r.register("Image Alt Attributes", |f| Some(f.images_with_alt > 0));
    r.register("Target Keyword in Image Alt Attributes", |f| {
        keyword_in(f, Some(&f.images_alt_text))
    });
    r.register("Canonical Tag", |f| Some(f.has_canonical));
    r.register("Noindex Tag Test", |f| {
        Some(
            !f.meta_robots_tag
                .as_deref()
                .map(|robots| robots.to_lowercase().contains("noindex"))
                .unwrap_or(false),
        )
    });
    r.register("Noindex Header Test", |f| Some(!f.noindex_header));
    r.register("SSL Enabled", |f| Some(f.has_ssl));
    r.register("XML Sitemaps", |f| Some(f.has_xml_sitemap));
    r.register("Analytics", |f| Some(f.has_analytics));
    r.register("Robots.txt", |f| Some(f.has_robots_txt));
    r.register("Blocked by Robots.txt", not_collected);
    // Local
    r.register("Address & Phone Shown on Website", |f| Some(f.has_address && f.has_phone));
    r.register("Local Business Schema", |f| Some(f.has_local_business_schema));
    r.register("Google Business Profile Identified", |f| Some(f.has_google_business_profile));
    r.register("Google Business Profile Completeness", |f| {
        Some(f.google_business_profile_completeness >= 80)
    });
    r.register("Google Reviews", |f| f.google_reviews_count.map(|count| count > 0));
    // Technology
    r.register("Technology List", not_collected);
    r.register("Server IP Address", not_collected);
    r.register("DNS Servers", not_collected);
    r.register("Web server", |f| {
        f.web_server.as_deref().map(|s| !s.trim().is_empty())
    });
    r.register("Charset", |f| Some(non_empty(&f.charset)));
    r.register("DMARC Record", not_collected);
    r.register("SPF Record", not_collected);
    // Keyword rankings
    r.register("Top Keyword Rankings", not_collected);
    r.register("Total Traffic From Search", not_collected);
    r.register("Keyword Positions", not_collected);
    // Links
    r.register("Backlink Summary", not_collected);
    r.register("Top Backlinks", not_collected);
    r.register("Top Pages by Backlinks", not_collected);
    r.register("Top Anchors by Backlinks", not_collected);
    r.register("Top Geographies", not_collected);
    r.register("On-Page Links", |f| Some(f.total_links > 0));
    r.register("Friendly Links", |f| Some(f.friendly_links > 0));
    r.register("Target Keyword in URL", |f| keyword_in(f, Some(&f.url)));
    // Usability
    r.register("Device Rendering", |f| Some(f.is_mobile_friendly));
    r.register("Use of Mobile Viewports", |f| Some(f.has_mobile_viewport));
    r.register("Google's Core Web Vitals", not_collected);
    r.register("Page Speed Insights - Mobile", not_collected);
    r.register("Page Speed Insights - Desktop", not_collected);
    r.register("Flash Used?", |f| Some(!f.has_flash));
    r.register("iFrames Used?", |f| Some(!f.has_iframes));
    r.register("Favicon", |f| Some(f.has_favicon));
    r.register("Email Privacy", not_collected);
    r.register("Legible Font Sizes", not_collected);
    r.register("Top Target Sizing", not_collected);
    // Performance
    r.register("Page Speed", not_collected);
    r.register("Download Page Size", |f| Some(f.page_size_kb <= 2000.0));
    r.register("Website Compression (Gzip, Deflate, Brotli)", not_collected);
    r.register("Number of Objects Loaded", |f| Some(f.objects_count < 100));
    r.register("Google Accelerated Mobile Pages (AMP)", |f| Some(f.has_amp));
    r.register("Javascript Errors", not_collected);
    r.register("HTTP2 Usage", not_collected);
    r.register("Image Optimization", not_collected);
    r.register("Minification", not_collected);
    r.register("Deprecated HTML", |f| Some(!f.deprecated_html_used));
    r.register("Inline Styles", |f| Some(!f.inline_styles_used));
    // Social
    r.register("Facebook Page Linked", |f| Some(f.facebook_page.is_some()));
    r.register("X (Formerly Twitter) Account Linked", |f| Some(f.twitter_account.is_some()));
    r.register("X Cards", |f| Some(f.has_twitter_card));
    r.register("Instagram Linked", |f| Some(f.instagram_profile.is_some()));
    r.register("YouTube Channel Linked", |f| Some(f.youtube_channel.is_some()));
    r.register("YouTube Channel Activity", not_collected);
    r.register("LinkedIn Page Linked", |f| Some(f.linkedin_page.is_some()));
}
