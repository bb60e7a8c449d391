//! PageSpeed Insights summary client
//!
//! Runs a Lighthouse audit for the root URL of a finished crawl, once with
//! the mobile strategy and once with the desktop strategy, and reduces each
//! report to scores, core metrics, savings opportunities and the first
//! screenshot thumbnail.

use crate::config::AuditConfig;
use crate::storage::{with_store, SharedStore, StorageError};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Errors raised while fetching or storing an audit
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("PageSpeed API key is not configured")]
    MissingApiKey,

    #[error("PageSpeed API error ({strategy}): {status} - {body}")]
    Api {
        strategy: &'static str,
        status: u16,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

const METRICS: &[(&str, &str)] = &[
    ("largestContentfulPaint", "largest-contentful-paint"),
    ("firstContentfulPaint", "first-contentful-paint"),
    ("timeToInteractive", "interactive"),
    ("cumulativeLayoutShift", "cumulative-layout-shift"),
    ("speedIndex", "speed-index"),
];

const OPPORTUNITIES: &[&str] = &[
    "uses-rel-preload",
    "uses-rel-preconnect",
    "render-blocking-resources",
    "unused-javascript",
    "unminified-css",
    "unminified-javascript",
    "redirects",
];

/// Audit reduced to what the dashboard shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditSummary {
    pub mobile: Value,
    pub desktop: Value,
}

/// Client for the PageSpeed Insights `runPagespeed` endpoint
#[derive(Clone)]
pub struct PageSpeedClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl PageSpeedClient {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// Builds a client from config, or `None` when audits are disabled
    pub fn from_config(client: Client, config: &AuditConfig) -> Result<Option<Self>, AuditError> {
        if !config.enabled {
            return Ok(None);
        }
        let key = config.resolved_api_key().ok_or(AuditError::MissingApiKey)?;
        Ok(Some(Self::new(client, config.endpoint.clone(), key)))
    }

    /// Fetches both strategies concurrently and summarizes them
    pub async fn summary(&self, url: &str) -> Result<AuditSummary, AuditError> {
        let (mobile, desktop) = tokio::try_join!(
            self.run_strategy(url, "mobile"),
            self.run_strategy(url, "desktop"),
        )?;

        Ok(AuditSummary {
            mobile: summarize(&mobile),
            desktop: summarize(&desktop),
        })
    }

    /// Audits `url` and stores the summary for the user
    pub async fn record(&self, store: &SharedStore, user_id: &str, url: &str) -> Result<(), AuditError> {
        let summary = self.summary(url).await?;
        let value = json!({ "mobile": summary.mobile, "desktop": summary.desktop });
        with_store(store, |s| s.record_audit(user_id, url, &value))?;
        tracing::info!("Stored performance audit for {}", url);
        Ok(())
    }

    async fn run_strategy(&self, url: &str, strategy: &'static str) -> Result<Value, AuditError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("url", url), ("strategy", strategy), ("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuditError::Api {
                strategy,
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

/// Reduces one Lighthouse report
pub fn summarize(report: &Value) -> Value {
    json!({
        "scores": extract_scores(report),
        "metrics": extract_metrics(report),
        "opportunities": extract_opportunities(report),
        "screenshot": extract_thumbnail(report),
    })
}

fn extract_scores(report: &Value) -> Value {
    let categories = &report["lighthouseResult"]["categories"];
    // Lighthouse scores are 0..1; a zero score is reported as missing
    let score = |name: &str| -> Value {
        match categories[name]["score"].as_f64() {
            Some(s) if s > 0.0 => json!((s * 100.0).round()),
            _ => Value::Null,
        }
    };

    json!({
        "performance": score("performance"),
        "accessibility": score("accessibility"),
        "bestPractices": score("best-practices"),
        "seo": score("seo"),
        "pwa": score("pwa"),
    })
}

fn extract_metrics(report: &Value) -> Value {
    let audits = &report["lighthouseResult"]["audits"];
    let mut metrics = serde_json::Map::new();

    for (name, key) in METRICS {
        let audit = &audits[*key];
        metrics.insert(
            name.to_string(),
            json!({
                "display": audit["displayValue"].as_str().unwrap_or("N/A"),
                "numeric": audit["numericValue"].as_f64(),
            }),
        );
    }

    Value::Object(metrics)
}

fn extract_opportunities(report: &Value) -> Value {
    let audits = &report["lighthouseResult"]["audits"];

    OPPORTUNITIES
        .iter()
        .filter_map(|key| {
            let audit = &audits[*key];
            let savings_ms = audit["details"]["overallSavingsMs"].as_f64().filter(|ms| *ms > 0.0)?;
            Some(json!({
                "title": audit["title"],
                "estimatedSavings": format!("{:.1}", savings_ms / 1000.0),
            }))
        })
        .collect()
}

fn extract_thumbnail(report: &Value) -> Value {
    report["lighthouseResult"]["audits"]["screenshot-thumbnails"]["details"]["items"][0]["data"]
        .clone()
}
