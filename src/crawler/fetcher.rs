//! Page fetching
//!
//! This module defines the page-fetch collaborator the processor talks to
//! and ships an HTTP implementation of it:
//! - `PageFetcher` opens one fetch resource (a "page") per URL
//! - `FetchPage` navigates that resource and must be closed afterwards
//! - `HttpFetcher` backs both with a shared reqwest client
//! - Error classification into `PageFault`

use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Per-page failure, contained at the page processor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageFault {
    #[error("Navigation timeout of {}s exceeded", .0.as_secs())]
    Timeout(Duration),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("HTTP error status {status}")]
    Http { status: u16 },

    #[error("Unsupported content type: {0}")]
    ContentMismatch(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Could not open page: {0}")]
    Resource(String),
}

/// Document returned by a successful navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    /// URL after redirects
    pub final_url: String,
    pub status: u16,
    pub html: String,
    /// Response headers with lowercase names
    pub headers: HashMap<String, String>,
    pub byte_size: usize,
}

/// Source of fetch resources
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Opens a fresh page; the caller must close it
    async fn open_page(&self) -> Result<Box<dyn FetchPage>, PageFault>;
}

/// One open fetch resource
#[async_trait]
pub trait FetchPage: Send {
    /// Loads `url`, giving up after `timeout`
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<PageSnapshot, PageFault>;

    /// Releases the resource
    async fn close(self: Box<Self>);
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use pinch_crawler::config::UserAgentConfig;
/// use pinch_crawler::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "PinchBot".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/bot".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// # Outcome Classification
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with HTML body | `PageSnapshot` |
/// | 4xx / 5xx | `PageFault::Http` |
/// | Non-HTML Content-Type | `PageFault::ContentMismatch` |
/// | Timeout | `PageFault::Timeout` |
/// | Connection / TLS / redirect error | `PageFault::Navigation` |
pub async fn fetch_snapshot(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<PageSnapshot, PageFault> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify_error(e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        return Err(PageFault::Http {
            status: status.as_u16(),
        });
    }

    let final_url = response.url().to_string();
    let headers: HashMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect();

    let content_type = headers.get("content-type").cloned().unwrap_or_default();
    if !is_html(&content_type) {
        return Err(PageFault::ContentMismatch(content_type));
    }

    let html = response
        .text()
        .await
        .map_err(|e| classify_error(e, timeout))?;

    Ok(PageSnapshot {
        final_url,
        status: status.as_u16(),
        byte_size: html.len(),
        html,
        headers,
    })
}

fn is_html(content_type: &str) -> bool {
    let lower = content_type.to_lowercase();
    lower.contains("text/html") || lower.contains("application/xhtml+xml")
}

fn classify_error(err: reqwest::Error, timeout: Duration) -> PageFault {
    if err.is_timeout() {
        PageFault::Timeout(timeout)
    } else if err.is_connect() {
        PageFault::Navigation(format!("Connection refused: {}", err))
    } else if err.is_redirect() {
        PageFault::Navigation(format!("Redirect error: {}", err))
    } else {
        PageFault::Navigation(err.to_string())
    }
}

/// HTTP-backed page fetcher
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn open_page(&self) -> Result<Box<dyn FetchPage>, PageFault> {
        Ok(Box::new(HttpPage {
            client: self.client.clone(),
        }))
    }
}

/// A page backed by a plain GET request
struct HttpPage {
    client: Client,
}

#[async_trait]
impl FetchPage for HttpPage {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<PageSnapshot, PageFault> {
        // The request timeout covers the body too, this guards slow DNS
        match tokio::time::timeout(timeout, fetch_snapshot(&self.client, url, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(PageFault::Timeout(timeout)),
        }
    }

    async fn close(self: Box<Self>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&create_test_config()).is_ok());
    }

    #[test]
    fn test_is_html() {
        assert!(is_html("text/html; charset=utf-8"));
        assert!(is_html("Application/XHTML+XML"));
        assert!(!is_html("application/pdf"));
        assert!(!is_html(""));
    }

    #[test]
    fn test_fault_messages() {
        assert_eq!(
            PageFault::Timeout(Duration::from_secs(60)).to_string(),
            "Navigation timeout of 60s exceeded"
        );
        assert_eq!(
            PageFault::Http { status: 404 }.to_string(),
            "HTTP error status 404"
        );
    }

    #[tokio::test]
    async fn test_connection_refused_is_navigation_fault() {
        let fetcher = HttpFetcher::new(&create_test_config()).unwrap();
        let mut page = fetcher.open_page().await.unwrap();
        // Port 9 (discard) is closed on loopback in test environments
        let result = page
            .navigate("http://127.0.0.1:9/", Duration::from_secs(5))
            .await;
        page.close().await;
        assert!(matches!(
            result,
            Err(PageFault::Navigation(_)) | Err(PageFault::Timeout(_))
        ));
    }
}
