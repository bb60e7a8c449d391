//! HTML parser for extracting links and on-page signals
//!
//! This module turns a fetched document into:
//! - `PageFeatures`, the signal record every check reads
//! - The list of outbound links to offer to the frontier

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use url::Url;

lazy_static! {
    // Street address: house number, street name, street suffix
    static ref ADDRESS_REGEX: Regex = Regex::new(
        r"(?i)\d{1,5}\s+[\w\s]+(?:Street|St|Ave|Avenue|Blvd|Road|Rd|Lane|Ln|Drive|Dr)\b"
    ).unwrap();

    // North American phone number
    static ref PHONE_REGEX: Regex = Regex::new(
        r"\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}"
    ).unwrap();

    static ref LOCAL_BUSINESS_REGEX: Regex = Regex::new(
        r#""@type"\s*:\s*"LocalBusiness""#
    ).unwrap();

    static ref CHARSET_REGEX: Regex = Regex::new(
        r"(?i)charset\s*=\s*([\w-]+)"
    ).unwrap();

    static ref FRIENDLY_PATH_REGEX: Regex = Regex::new(
        r"^(/[a-z0-9-]*)*/?$"
    ).unwrap();
}

/// Tags flagged by the deprecated-HTML check
const DEPRECATED_TAGS: &str = "font, center, marquee, blink, big, strike, tt, frameset, frame";

/// Signals extracted from one page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFeatures {
    pub url: String,

    // On-page
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1: Option<String>,
    pub h1_count: usize,
    pub h2toh6_count: usize,
    /// Visible body text, whitespace-collapsed
    pub keyword_usage: String,
    pub word_count: usize,
    pub alt_tags: Vec<String>,
    pub images_with_alt: usize,
    pub images_alt_text: String,
    pub has_canonical: bool,
    pub canonical_url: Option<String>,
    pub meta_robots_tag: Option<String>,
    pub noindex_meta: bool,
    pub noindex_header: bool,
    #[serde(rename = "hasSSL")]
    pub has_ssl: bool,
    pub has_analytics: bool,
    pub has_robots_txt: bool,
    pub hreflang: bool,
    pub lang_attr: Option<String>,

    // Links
    pub total_links: usize,
    pub internal_links: usize,
    pub external_links: usize,
    pub friendly_links: usize,

    // Social
    pub has_open_graph: bool,
    pub has_twitter_card: bool,
    pub facebook_page: Option<String>,
    pub instagram_profile: Option<String>,
    pub twitter_account: Option<String>,
    pub youtube_channel: Option<String>,
    pub linkedin_page: Option<String>,

    // Usability
    pub has_mobile_viewport: bool,
    pub is_mobile_friendly: bool,
    pub has_flash: bool,
    pub has_iframes: bool,
    pub has_favicon: bool,

    // Local
    pub has_address: bool,
    pub has_phone: bool,
    pub has_local_business_schema: bool,
    pub has_google_business_profile: bool,
    pub google_business_profile_completeness: u8,
    pub google_reviews_count: Option<u32>,

    // Technology and performance
    pub charset: Option<String>,
    pub web_server: Option<String>,
    #[serde(rename = "hasAMP")]
    pub has_amp: bool,
    #[serde(rename = "hasXMLSitemap")]
    pub has_xml_sitemap: bool,
    #[serde(rename = "pageSizeKB")]
    pub page_size_kb: f64,
    pub objects_count: usize,
    pub deprecated_html_used: bool,
    pub inline_styles_used: bool,

    /// Target keyword for the keyword checks, when one is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    pub features: PageFeatures,

    /// Absolute http(s) links in document order, without duplicates
    pub links: Vec<String>,
}

/// Parses HTML content and extracts features and links
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `page_url` - Final URL of the page, used to resolve relative links
/// * `headers` - Response headers with lowercase names
///
/// # Example
///
/// ```
/// use pinch_crawler::crawler::parse_html;
/// use std::collections::HashMap;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url, &HashMap::new());
/// assert_eq!(parsed.features.title, Some("Test".to_string()));
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_html(html: &str, page_url: &Url, headers: &HashMap<String, String>) -> ParsedPage {
    let document = Html::parse_document(html);
    let features = extract_features(&document, html, page_url, headers);
    let links = extract_links(&document, page_url);
    ParsedPage { features, links }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(sel) => document.select(&sel).collect(),
        None => Vec::new(),
    }
}

fn first_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
    select_all(document, css)
        .into_iter()
        .find_map(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text of an element excluding script and style contents
fn visible_text(element: ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in element.descendants() {
        if let Some(text) = node.value().as_text() {
            let hidden = node
                .parent()
                .and_then(|p| p.value().as_element())
                .map(|e| matches!(e.name(), "script" | "style" | "noscript"))
                .unwrap_or(false);
            if !hidden {
                parts.push(text);
            }
        }
    }
    parts
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_link_containing(hrefs: &[&str], needles: &[&str]) -> Option<String> {
    hrefs
        .iter()
        .find(|href| {
            let lower = href.to_lowercase();
            needles.iter().any(|n| lower.contains(n))
        })
        .map(|href| href.to_string())
}

fn extract_features(
    document: &Html,
    html: &str,
    page_url: &Url,
    headers: &HashMap<String, String>,
) -> PageFeatures {
    let host = page_url.host_str().unwrap_or_default().to_lowercase();
    let lower_html = html.to_lowercase();

    // Headings
    let h1s = select_all(document, "h1");
    let h1 = h1s
        .first()
        .map(|el| element_text(*el))
        .filter(|t| !t.is_empty());

    // Body text
    let keyword_usage = select_all(document, "body")
        .first()
        .map(|body| visible_text(*body))
        .unwrap_or_default();
    let word_count = keyword_usage.split_whitespace().count();

    // Images
    let alt_tags: Vec<String> = select_all(document, "img")
        .iter()
        .map(|img| img.value().attr("alt").unwrap_or("").to_string())
        .collect();
    let alts_present: Vec<&str> = alt_tags
        .iter()
        .map(|alt| alt.trim())
        .filter(|alt| !alt.is_empty())
        .collect();
    let images_with_alt = alts_present.len();
    let images_alt_text = alts_present.join(" ");

    // Indexing
    let canonical_url = first_attr(document, "link[rel='canonical']", "href");
    let meta_robots_tag = first_attr(document, "meta[name='robots']", "content");
    let noindex_meta = meta_robots_tag
        .as_deref()
        .map(|r| r.to_lowercase().contains("noindex"))
        .unwrap_or(false);
    let meta_x_robots = select_all(document, "meta[http-equiv]")
        .into_iter()
        .filter(|el| {
            el.value()
                .attr("http-equiv")
                .map(|v| v.eq_ignore_ascii_case("x-robots-tag"))
                .unwrap_or(false)
        })
        .filter_map(|el| el.value().attr("content"))
        .any(|content| content.to_lowercase().contains("noindex"));
    let header_x_robots = headers
        .get("x-robots-tag")
        .map(|v| v.to_lowercase().contains("noindex"))
        .unwrap_or(false);

    // Analytics
    let analytics_src = select_all(document, "script[src]").iter().any(|s| {
        s.value()
            .attr("src")
            .map(|src| src.contains("analytics") || src.contains("googletagmanager"))
            .unwrap_or(false)
    });
    let analytics_inline = select_all(document, "script")
        .iter()
        .any(|s| element_text(*s).contains("gtag"));

    // Links
    let anchors = select_all(document, "a");
    let hrefs: Vec<&str> = anchors
        .iter()
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .collect();
    let internal_links = hrefs
        .iter()
        .filter(|h| h.starts_with('/') || (!host.is_empty() && h.to_lowercase().contains(&host)))
        .count();
    let external_links = hrefs
        .iter()
        .filter(|h| h.starts_with("http") && !h.to_lowercase().contains(&host))
        .count();
    let friendly_links = hrefs
        .iter()
        .filter_map(|h| resolve_link(h, page_url))
        .filter_map(|link| Url::parse(&link).ok())
        .filter(|u| u.host_str().map(|h| h.eq_ignore_ascii_case(&host)).unwrap_or(false))
        .filter(|u| u.query().is_none() && FRIENDLY_PATH_REGEX.is_match(u.path()))
        .count();

    // Viewport
    let viewport = first_attr(document, "meta[name='viewport']", "content");
    let has_mobile_viewport = !select_all(document, "meta[name='viewport']").is_empty();

    // Local
    let has_google_business_profile = hrefs.iter().any(|h| h.contains("google.com/maps/place"));

    // Charset: <meta charset>, then http-equiv content type, then the response header
    let charset = first_attr(document, "meta[charset]", "charset")
        .or_else(|| {
            first_attr(document, "meta[http-equiv][content*='charset']", "content")
                .and_then(|c| CHARSET_REGEX.captures(&c).map(|m| m[1].to_string()))
        })
        .or_else(|| {
            headers
                .get("content-type")
                .and_then(|c| CHARSET_REGEX.captures(c).map(|m| m[1].to_string()))
        });

    let objects_count = [
        "img[src]",
        "script[src]",
        "link[rel='stylesheet']",
        "iframe[src]",
        "video",
        "audio",
        "embed",
    ]
    .iter()
    .map(|css| select_all(document, css).len())
    .sum();

    PageFeatures {
        url: page_url.to_string(),
        title: select_all(document, "title")
            .first()
            .map(|el| element_text(*el))
            .filter(|t| !t.is_empty()),
        meta_description: first_attr(document, "meta[name='description']", "content"),
        h1,
        h1_count: h1s.len(),
        h2toh6_count: select_all(document, "h2, h3, h4, h5, h6").len(),
        keyword_usage,
        word_count,
        alt_tags,
        images_with_alt,
        images_alt_text,
        has_canonical: canonical_url.is_some(),
        canonical_url,
        meta_robots_tag,
        noindex_meta,
        noindex_header: meta_x_robots || header_x_robots,
        has_ssl: page_url.scheme() == "https",
        has_analytics: analytics_src || analytics_inline,
        has_robots_txt: page_url.path().ends_with("/robots.txt"),
        hreflang: !select_all(document, "link[rel='alternate'][hreflang]").is_empty(),
        lang_attr: first_attr(document, "html", "lang"),
        total_links: anchors.len(),
        internal_links,
        external_links,
        friendly_links,
        has_open_graph: !select_all(document, "meta[property^='og:']").is_empty(),
        has_twitter_card: !select_all(document, "meta[name='twitter:card']").is_empty(),
        facebook_page: first_link_containing(&hrefs, &["facebook.com"]),
        instagram_profile: first_link_containing(&hrefs, &["instagram.com"]),
        twitter_account: first_link_containing(&hrefs, &["twitter.com", "://x.com", ".x.com"]),
        youtube_channel: first_link_containing(&hrefs, &["youtube.com"]),
        linkedin_page: first_link_containing(&hrefs, &["linkedin.com"]),
        is_mobile_friendly: viewport
            .map(|v| v.contains("width=device-width"))
            .unwrap_or(false),
        has_mobile_viewport,
        has_flash: !select_all(
            document,
            "object[type='application/x-shockwave-flash'], embed[src$='.swf']",
        )
        .is_empty(),
        has_iframes: !select_all(document, "iframe").is_empty(),
        has_favicon: !select_all(document, "link[rel~='icon']").is_empty(),
        has_address: ADDRESS_REGEX.is_match(html),
        has_phone: PHONE_REGEX.is_match(html),
        has_local_business_schema: LOCAL_BUSINESS_REGEX.is_match(html),
        has_google_business_profile,
        google_business_profile_completeness: if has_google_business_profile { 80 } else { 0 },
        google_reviews_count: None,
        charset,
        web_server: headers.get("server").cloned(),
        has_amp: !select_all(document, "link[rel='amphtml']").is_empty(),
        has_xml_sitemap: lower_html.contains("sitemap"),
        page_size_kb: html.len() as f64 / 1024.0,
        objects_count,
        deprecated_html_used: !select_all(document, DEPRECATED_TAGS).is_empty(),
        inline_styles_used: !select_all(document, "[style]").is_empty(),
        keyword: None,
    }
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in select_all(document, "a[href]") {
        if let Some(href) = element.value().attr("href") {
            if let Some(absolute_url) = resolve_link(href, base_url) {
                if seen.insert(absolute_url.clone()) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - fragment-only links
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
