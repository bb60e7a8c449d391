use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for the crawler service
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    /// Subscription plans keyed by plan name (e.g. "basic", "pro")
    #[serde(default)]
    pub plans: BTreeMap<String, PlanLimits>,
}

impl Config {
    /// Looks up the limits for a plan name
    pub fn plan(&self, name: &str) -> Option<&PlanLimits> {
        self.plans.get(name)
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of pages fetched in parallel within one session
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Navigation timeout for a single page (seconds)
    #[serde(rename = "page-timeout-secs", default = "default_page_timeout")]
    pub page_timeout_secs: u64,

    /// Window in which progress events are collapsed (milliseconds)
    #[serde(rename = "progress-window-ms", default = "default_progress_window")]
    pub progress_window_ms: u64,

    /// Optional depth bound applied when the plan does not set one
    #[serde(rename = "max-depth", default)]
    pub max_depth: Option<u32>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            page_timeout_secs: default_page_timeout(),
            progress_window_ms: default_progress_window(),
            max_depth: None,
        }
    }
}

fn default_concurrency() -> u32 {
    1
}

fn default_page_timeout() -> u64 {
    60
}

fn default_progress_window() -> u64 {
    300
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Subscriber-facing server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the WebSocket server binds to
    #[serde(rename = "bind-address")]
    pub bind_address: String,
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Single-flight lock configuration
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaConfig {
    /// Age after which a crawl lock is considered abandoned (seconds)
    #[serde(rename = "stale-lock-secs", default = "default_stale_lock")]
    pub stale_lock_secs: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            stale_lock_secs: default_stale_lock(),
        }
    }
}

fn default_stale_lock() -> u64 {
    3600
}

/// Performance audit (PageSpeed Insights) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub enabled: bool,

    /// API key; falls back to the PAGESPEED_API_KEY environment variable
    #[serde(rename = "api-key", default)]
    pub api_key: Option<String>,

    #[serde(default = "default_audit_endpoint")]
    pub endpoint: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            endpoint: default_audit_endpoint(),
        }
    }
}

impl AuditConfig {
    /// Resolves the API key from config or environment
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("PAGESPEED_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }
}

fn default_audit_endpoint() -> String {
    "https://www.googleapis.com/pagespeedonline/v5/runPagespeed".to_string()
}

/// Crawl limits attached to a subscription plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PlanLimits {
    /// Websites an account may crawl per calendar month
    #[serde(rename = "monthly-website-limit")]
    pub monthly_website_limit: u32,

    /// Pages visited per crawl session
    #[serde(rename = "per-website-page-limit")]
    pub per_website_page_limit: u32,

    /// Optional link depth bound for this plan
    #[serde(rename = "max-depth", default)]
    pub max_depth: Option<u32>,
}
