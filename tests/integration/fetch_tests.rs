//! HTTP fetcher tests against a mock server

use pinch_crawler::config::UserAgentConfig;
use pinch_crawler::crawler::{FetchPage, HttpFetcher, PageFault, PageFetcher};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "PinchBot".to_string(),
        crawler_version: "1.0".to_string(),
        contact_url: "https://example.com/bot".to_string(),
    }
}

async fn navigate(url: &str, timeout: Duration) -> Result<pinch_crawler::crawler::PageSnapshot, PageFault> {
    let fetcher = HttpFetcher::new(&user_agent()).unwrap();
    let mut page = fetcher.open_page().await.unwrap();
    let result = page.navigate(url, timeout).await;
    page.close().await;
    result
}

#[tokio::test]
async fn test_html_page_snapshot() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><head><title>About</title></head></html>", "text/html")
                .insert_header("server", "nginx"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/about", mock_server.uri());
    let snapshot = navigate(&url, Duration::from_secs(5)).await.unwrap();

    assert_eq!(snapshot.status, 200);
    assert_eq!(snapshot.final_url, url);
    assert!(snapshot.html.contains("<title>About</title>"));
    assert_eq!(snapshot.byte_size, snapshot.html.len());
    assert_eq!(snapshot.headers.get("server").map(String::as_str), Some("nginx"));
}

#[tokio::test]
async fn test_sends_configured_user_agent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("user-agent", "PinchBot/1.0 (+https://example.com/bot)"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = navigate(&mock_server.uri(), Duration::from_secs(5)).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_error_status_is_http_fault() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let result = navigate(&format!("{}/missing", mock_server.uri()), Duration::from_secs(5)).await;
    assert_eq!(result, Err(PageFault::Http { status: 404 }));
}

#[tokio::test]
async fn test_non_html_is_content_mismatch() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
        .mount(&mock_server)
        .await;

    let result = navigate(&format!("{}/report.pdf", mock_server.uri()), Duration::from_secs(5)).await;
    assert!(matches!(result, Err(PageFault::ContentMismatch(ct)) if ct.contains("application/pdf")));
}

#[tokio::test]
async fn test_slow_page_times_out() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html></html>", "text/html")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let timeout = Duration::from_millis(300);
    let result = navigate(&mock_server.uri(), timeout).await;
    assert_eq!(result, Err(PageFault::Timeout(timeout)));
}
