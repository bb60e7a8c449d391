//! Performance audit client tests against a mock PageSpeed endpoint

use crate::common::store_with_user;
use pinch_crawler::audit::{AuditError, PageSpeedClient};
use pinch_crawler::storage::with_store;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn report(performance: f64, lcp: &str) -> serde_json::Value {
    json!({
        "lighthouseResult": {
            "categories": {
                "performance": { "score": performance },
                "accessibility": { "score": 0.9 },
                "best-practices": { "score": 1.0 },
                "seo": { "score": 0.8 }
            },
            "audits": {
                "largest-contentful-paint": { "displayValue": lcp, "numericValue": 2400.0 },
                "render-blocking-resources": {
                    "title": "Eliminate render-blocking resources",
                    "details": { "overallSavingsMs": 1200.0 }
                }
            }
        }
    })
}

async fn mount_strategy(server: &MockServer, strategy: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/runPagespeed"))
        .and(query_param("strategy", strategy))
        .and(query_param("key", "test-key"))
        .and(query_param("url", "https://site.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

fn client(server: &MockServer) -> PageSpeedClient {
    PageSpeedClient::new(
        reqwest::Client::new(),
        format!("{}/runPagespeed", server.uri()),
        "test-key",
    )
}

#[tokio::test]
async fn test_summary_fetches_both_strategies() {
    let mock_server = MockServer::start().await;
    mount_strategy(&mock_server, "mobile", report(0.42, "4.1 s")).await;
    mount_strategy(&mock_server, "desktop", report(0.97, "1.2 s")).await;

    let summary = client(&mock_server).summary("https://site.test").await.unwrap();

    assert_eq!(summary.mobile["scores"]["performance"], json!(42.0));
    assert_eq!(summary.desktop["scores"]["performance"], json!(97.0));
    assert_eq!(summary.mobile["metrics"]["largestContentfulPaint"]["display"], "4.1 s");
    assert_eq!(summary.desktop["metrics"]["largestContentfulPaint"]["display"], "1.2 s");
}

#[tokio::test]
async fn test_record_stores_summary() {
    let mock_server = MockServer::start().await;
    mount_strategy(&mock_server, "mobile", report(0.5, "3.0 s")).await;
    mount_strategy(&mock_server, "desktop", report(0.9, "1.0 s")).await;
    let store = store_with_user();

    client(&mock_server)
        .record(&store, "u1", "https://site.test")
        .await
        .unwrap();

    let audit = with_store(&store, |s| s.latest_audit("u1", "https://site.test"))
        .unwrap()
        .unwrap();
    assert_eq!(audit.summary["mobile"]["scores"]["performance"], json!(50.0));
    assert_eq!(audit.summary["desktop"]["scores"]["performance"], json!(90.0));
}

#[tokio::test]
async fn test_api_error_is_reported() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("quota exhausted"))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).summary("https://site.test").await;
    assert!(matches!(result, Err(AuditError::Api { status: 500, .. })));
}
