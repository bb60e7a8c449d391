//! Shared fixtures for integration tests

use async_trait::async_trait;
use pinch_crawler::config::PlanLimits;
use pinch_crawler::crawler::{FetchPage, PageFault, PageFetcher, PageProcessor, PageSnapshot, SessionRunner};
use pinch_crawler::quota::QuotaGuard;
use pinch_crawler::rules::CheckRegistry;
use pinch_crawler::state::CrawlSession;
use pinch_crawler::storage::{share, AccountStore, SharedStore, SqliteStore};
use pinch_crawler::stream::spawn_streamer;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const INSTANCE: &str = "test-instance";

/// In-memory site; URLs not in the map fail with a navigation fault
#[derive(Clone, Default)]
pub struct SiteFetcher {
    pages: Arc<HashMap<String, String>>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl SiteFetcher {
    pub fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: Arc::new(
                pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.to_string()))
                    .collect(),
            ),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// URLs navigated so far, in order
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for SiteFetcher {
    async fn open_page(&self) -> Result<Box<dyn FetchPage>, PageFault> {
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl FetchPage for SiteFetcher {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<PageSnapshot, PageFault> {
        self.requested.lock().unwrap().push(url.to_string());
        let html = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| PageFault::Navigation(format!("net::ERR_NAME_NOT_RESOLVED at {}", url)))?;
        Ok(PageSnapshot {
            final_url: url.to_string(),
            status: 200,
            byte_size: html.len(),
            html,
            headers: HashMap::new(),
        })
    }

    async fn close(self: Box<Self>) {}
}

/// HTML page with one anchor per href
pub fn page(title: &str, hrefs: &[&str]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body><h1>{}</h1>{}</body></html>",
        title, title, anchors
    )
}

pub fn plans(monthly_website_limit: u32, per_website_page_limit: u32) -> BTreeMap<String, PlanLimits> {
    let mut plans = BTreeMap::new();
    plans.insert(
        "basic".to_string(),
        PlanLimits {
            monthly_website_limit,
            per_website_page_limit,
            max_depth: None,
        },
    );
    plans
}

/// Store with user `u1` on the `basic` plan
pub fn store_with_user() -> SharedStore {
    let mut store = SqliteStore::new_in_memory().unwrap();
    store.upsert_user("u1", "basic").unwrap();
    share(store)
}

pub fn runner(
    store: SharedStore,
    fetcher: SiteFetcher,
    plans: BTreeMap<String, PlanLimits>,
) -> SessionRunner {
    let guard = Arc::new(QuotaGuard::new(store.clone(), plans, INSTANCE, 3600));
    let processor = PageProcessor::new(
        Arc::new(fetcher),
        Arc::new(CheckRegistry::with_defaults()),
        Duration::from_secs(5),
    );
    SessionRunner::new(guard, store, processor, 1)
}

/// Runs one request and returns the session plus every frame sent
pub async fn run_session(
    runner: &SessionRunner,
    user_id: &str,
    url: &str,
) -> (Option<CrawlSession>, Vec<serde_json::Value>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (events, streamer) = spawn_streamer(Duration::from_millis(10), tx);

    let session = runner.run(user_id, url, events, CancellationToken::new()).await;
    streamer.await.unwrap();

    let mut frames = Vec::new();
    while let Some(frame) = rx.recv().await {
        frames.push(serde_json::from_str(&frame).unwrap());
    }
    (session, frames)
}

pub fn frames_of<'a>(frames: &'a [serde_json::Value], kind: &str) -> Vec<&'a serde_json::Value> {
    frames.iter().filter(|f| f["type"] == kind).collect()
}
