//! WebSocket protocol tests against a running server

use crate::common::{page, plans, runner, store_with_user, SiteFetcher};
use futures::{SinkExt, StreamExt};
use pinch_crawler::server::CrawlServer;
use pinch_crawler::storage::with_store;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start(server: CrawlServer) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = server.shutdown_token();
        let handle = tokio::spawn(async move {
            server.serve(listener).await.unwrap();
        });
        Self {
            addr,
            shutdown,
            handle,
        }
    }

    async fn connect(&self) -> Client {
        let (socket, _) = connect_async(format!("ws://{}", self.addr)).await.unwrap();
        socket
    }

    async fn stop(self) {
        self.shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .unwrap()
            .unwrap();
    }
}

fn crawl_server(fetcher: SiteFetcher) -> (CrawlServer, pinch_crawler::storage::SharedStore) {
    let store = store_with_user();
    let runner = runner(store.clone(), fetcher, plans(5, 50));
    (
        CrawlServer::new(Arc::new(runner), Duration::from_millis(20)),
        store,
    )
}

async fn next_frame(client: &mut Client) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn send(client: &mut Client, text: &str) {
    client.send(Message::Text(text.to_string())).await.unwrap();
}

#[tokio::test]
async fn test_malformed_messages_get_error_frames() {
    let (server, _) = crawl_server(SiteFetcher::default());
    let server = TestServer::start(server).await;
    let mut client = server.connect().await;

    send(&mut client, "{not json").await;
    let frame = next_frame(&mut client).await;
    assert_eq!(frame["type"], "error");
    assert_eq!(frame["message"], "Invalid JSON format");

    send(&mut client, r#"{"type":"stop-crawl"}"#).await;
    assert_eq!(next_frame(&mut client).await["message"], "Unknown message type");

    send(&mut client, r#"{"type":"start-crawl","url":"https://site.test"}"#).await;
    assert_eq!(
        next_frame(&mut client).await["message"],
        "Missing required fields: url and userId"
    );

    client.close(None).await.unwrap();
    server.stop().await;
}

#[tokio::test]
async fn test_start_crawl_streams_until_done() {
    let fetcher = SiteFetcher::new(&[
        ("https://site.test", &page("Home", &["/a"])),
        ("https://site.test/a", &page("A", &[])),
    ]);
    let (server, store) = crawl_server(fetcher);
    let server = TestServer::start(server).await;
    let mut client = server.connect().await;

    send(
        &mut client,
        r#"{"type":"start-crawl","url":"site.test","userId":"u1"}"#,
    )
    .await;

    let mut kinds = Vec::new();
    let done = loop {
        let frame = next_frame(&mut client).await;
        let kind = frame["type"].as_str().unwrap().to_string();
        kinds.push(kind.clone());
        if kind == "done" {
            break frame;
        }
    };

    assert_eq!(done["data"]["totalPages"], 2);
    assert!(kinds.contains(&"issue".to_string()));
    assert!(!kinds.contains(&"error".to_string()));

    let user = with_store(&store, |s| s.get_user("u1")).unwrap().unwrap();
    assert!(!user.is_crawling);
    assert_eq!(user.crawl_usage.websites_crawled, 1);

    client.close(None).await.unwrap();
    server.stop().await;
}

#[tokio::test]
async fn test_rejected_request_gets_single_error() {
    let (server, store) = crawl_server(SiteFetcher::default());
    let server = TestServer::start(server).await;
    let mut client = server.connect().await;

    send(
        &mut client,
        r#"{"type":"start-crawl","url":"https://site.test","userId":"ghost"}"#,
    )
    .await;

    let frame = next_frame(&mut client).await;
    assert_eq!(frame["type"], "error");
    assert_eq!(frame["message"], "User not found");

    let user = with_store(&store, |s| s.get_user("u1")).unwrap().unwrap();
    assert_eq!(user.crawl_usage.websites_crawled, 0);

    client.close(None).await.unwrap();
    server.stop().await;
}
