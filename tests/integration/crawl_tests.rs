//! End-to-end session tests
//!
//! These run the session runner against an in-memory site and a real
//! SQLite store, checking emitted frames and persisted usage.

use crate::common::{frames_of, page, plans, run_session, runner, store_with_user, SiteFetcher, INSTANCE};
use chrono::Utc;
use pinch_crawler::quota::month_key;
use pinch_crawler::storage::{with_store, AccountStore, CrawlLogRecord, SharedStore, SqliteStore, StorageError, StorageResult};
use pinch_crawler::storage::{share, AuditRecord, CrawlLock, UserRecord};
use pinch_crawler::SessionStatus;

fn user(store: &SharedStore) -> UserRecord {
    with_store(store, |s| s.get_user("u1")).unwrap().unwrap()
}

#[tokio::test]
async fn test_site_scenario_two_pages() {
    let fetcher = SiteFetcher::new(&[
        ("https://site.test", &page("Home", &["/a", "https://other.test/"])),
        ("https://site.test/a", &page("A", &[])),
    ]);
    let store = store_with_user();
    let runner = runner(store.clone(), fetcher.clone(), plans(5, 2));

    let (session, frames) = run_session(&runner, "u1", "https://site.test/").await;
    let session = session.unwrap();

    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(
        fetcher.requested(),
        vec!["https://site.test".to_string(), "https://site.test/a".to_string()]
    );
    assert!(!fetcher.requested().iter().any(|u| u.contains("other.test")));

    let done = frames_of(&frames, "done");
    assert_eq!(done.len(), 1);
    assert_eq!(done[0]["data"]["totalPages"], 2);
    assert_eq!(done[0]["data"]["message"], "Crawl completed.");
    assert_eq!(frames.last().unwrap()["type"], "done");
    assert!(frames_of(&frames, "error").is_empty());

    let record = user(&store);
    assert!(!record.is_crawling);
    assert_eq!(record.crawl_usage.websites_crawled, 1);
    assert_eq!(record.crawl_usage.pages_crawled, 2);

    let logs = with_store(&store, |s| s.recent_crawl_logs("u1", 10)).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].start_url, "https://site.test");
    assert_eq!(logs[0].pages_crawled, 2);
    assert_eq!(logs[0].urls, session.crawled_urls);
}

#[tokio::test]
async fn test_budget_emits_single_limit_event() {
    let fetcher = SiteFetcher::new(&[
        ("https://site.test", &page("Home", &["/a", "/b", "/c", "/d"])),
        ("https://site.test/a", &page("A", &["/e", "/f"])),
        ("https://site.test/b", &page("B", &["/g"])),
    ]);
    let store = store_with_user();
    let runner = runner(store.clone(), fetcher.clone(), plans(5, 3));

    let (session, frames) = run_session(&runner, "u1", "https://site.test").await;

    assert_eq!(session.unwrap().visited, 3);
    assert_eq!(fetcher.requested().len(), 3);

    let limits = frames_of(&frames, "limit_reached");
    assert_eq!(limits.len(), 1);
    assert_eq!(limits[0]["message"], "Crawl limit of 3 pages reached.");
    assert_eq!(limits[0]["totalPages"], 3);
    assert_eq!(frames_of(&frames, "done").len(), 1);
}

#[tokio::test]
async fn test_blocked_and_duplicate_links_are_skipped() {
    let fetcher = SiteFetcher::new(&[
        (
            "https://site.test",
            &page(
                "Home",
                &["/checkout", "/page?utm_term=spring", "/about", "/about/", "/About#team"],
            ),
        ),
        ("https://site.test/about", &page("About", &["/"])),
    ]);
    let runner = runner(store_with_user(), fetcher.clone(), plans(5, 50));

    run_session(&runner, "u1", "https://site.test").await;

    assert_eq!(
        fetcher.requested(),
        vec!["https://site.test".to_string(), "https://site.test/about".to_string()]
    );
}

#[tokio::test]
async fn test_page_fault_reports_error_and_continues() {
    let fetcher = SiteFetcher::new(&[
        ("https://site.test", &page("Home", &["/gone", "/ok"])),
        ("https://site.test/ok", &page("Ok", &[])),
    ]);
    let runner = runner(store_with_user(), fetcher, plans(5, 50));

    let (session, frames) = run_session(&runner, "u1", "https://site.test").await;

    let errors = frames_of(&frames, "error");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["data"]["url"], "https://site.test/gone");
    let done = frames_of(&frames, "done");
    assert_eq!(done[0]["data"]["totalPages"], 3);
    assert_eq!(session.unwrap().status, SessionStatus::Completed);
}

#[tokio::test]
async fn test_issue_frames_carry_findings() {
    let fetcher = SiteFetcher::new(&[("https://site.test", &page("Home", &[]))]);
    let runner = runner(store_with_user(), fetcher, plans(5, 50));

    let (_, frames) = run_session(&runner, "u1", "https://site.test").await;

    let issues = frames_of(&frames, "issue");
    assert_eq!(issues.len(), 1);
    let findings = issues[0]["data"]["issues"].as_array().unwrap();
    assert!(findings
        .iter()
        .any(|f| f["check"] == "Meta Description Tag" && f["pass"] == false));
    assert!(findings.iter().all(|f| f["pass"] != true));
    assert_eq!(issues[0]["data"]["finalData"]["title"], "Home");
}

#[tokio::test]
async fn test_second_admission_rejected_without_mutation() {
    let fetcher = SiteFetcher::new(&[("https://site.test", &page("Home", &[]))]);
    let store = store_with_user();
    with_store(&store, |s| s.acquire_crawl_lock("u1", INSTANCE, Utc::now())).unwrap();
    let before = user(&store);
    let runner = runner(store.clone(), fetcher.clone(), plans(5, 50));

    let (session, frames) = run_session(&runner, "u1", "https://site.test").await;

    assert!(session.is_none());
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["type"], "error");
    assert_eq!(
        frames[0]["message"],
        "A crawl is already in progress. Please wait for it to finish."
    );
    assert!(fetcher.requested().is_empty());
    assert_eq!(user(&store), before);
}

#[tokio::test]
async fn test_unknown_user_rejected() {
    let runner = runner(store_with_user(), SiteFetcher::default(), plans(5, 50));
    let (session, frames) = run_session(&runner, "nobody", "https://site.test").await;

    assert!(session.is_none());
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["message"], "User not found");
}

#[tokio::test]
async fn test_monthly_cap_rejected() {
    let store = store_with_user();
    let month = month_key(Utc::now());
    with_store(&store, |s| {
        s.reset_usage("u1", &month)?;
        s.increment_usage("u1", &month, 10)
    })
    .unwrap();
    let runner = runner(store.clone(), SiteFetcher::default(), plans(1, 50));

    let (_, frames) = run_session(&runner, "u1", "https://site.test").await;

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["message"], "You've reached your monthly crawl limit (1)");
    assert!(!user(&store).is_crawling);
}

#[tokio::test]
async fn test_invalid_start_url_rejected() {
    let store = store_with_user();
    let runner = runner(store.clone(), SiteFetcher::default(), plans(5, 50));

    let (session, frames) = run_session(&runner, "u1", "httpx://site.test").await;

    assert!(session.is_none());
    assert_eq!(frames_of(&frames, "error").len(), 1);
    assert!(!user(&store).is_crawling);
}

#[tokio::test]
async fn test_stale_flag_from_crashed_instance_is_reclaimed() {
    let fetcher = SiteFetcher::new(&[("https://site.test", &page("Home", &[]))]);
    let store = store_with_user();
    let month = month_key(Utc::now());
    // Finalization interrupted after the counter update, before the flag clear
    with_store(&store, |s| {
        s.reset_usage("u1", &month)?;
        s.acquire_crawl_lock("u1", "crashed-instance", Utc::now())?;
        s.increment_usage("u1", &month, 4)
    })
    .unwrap();
    let runner = runner(store.clone(), fetcher, plans(5, 50));

    let (session, frames) = run_session(&runner, "u1", "https://site.test").await;

    assert_eq!(session.unwrap().status, SessionStatus::Completed);
    assert_eq!(frames_of(&frames, "done").len(), 1);
    let record = user(&store);
    assert!(!record.is_crawling);
    assert_eq!(record.crawl_usage.websites_crawled, 2);
    assert_eq!(record.crawl_usage.pages_crawled, 5);
}

/// Store whose crawl-log writes always fail
struct BrokenLogStore {
    inner: SqliteStore,
}

impl AccountStore for BrokenLogStore {
    fn get_user(&self, user_id: &str) -> StorageResult<Option<UserRecord>> {
        self.inner.get_user(user_id)
    }

    fn upsert_user(&mut self, user_id: &str, plan: &str) -> StorageResult<()> {
        self.inner.upsert_user(user_id, plan)
    }

    fn reset_usage(&mut self, user_id: &str, month: &str) -> StorageResult<()> {
        self.inner.reset_usage(user_id, month)
    }

    fn increment_usage(&mut self, user_id: &str, month: &str, pages: u32) -> StorageResult<()> {
        self.inner.increment_usage(user_id, month, pages)
    }

    fn acquire_crawl_lock(
        &mut self,
        user_id: &str,
        owner: &str,
        acquired_at: chrono::DateTime<Utc>,
    ) -> StorageResult<()> {
        self.inner.acquire_crawl_lock(user_id, owner, acquired_at)
    }

    fn release_crawl_lock(&mut self, user_id: &str, lease: Option<&CrawlLock>) -> StorageResult<bool> {
        self.inner.release_crawl_lock(user_id, lease)
    }

    fn clear_stale_locks(&mut self, current_owner: &str) -> StorageResult<Vec<String>> {
        self.inner.clear_stale_locks(current_owner)
    }

    fn append_crawl_log(&mut self, _log: &CrawlLogRecord) -> StorageResult<i64> {
        Err(StorageError::Database("disk full".to_string()))
    }

    fn recent_crawl_logs(&self, user_id: &str, limit: usize) -> StorageResult<Vec<CrawlLogRecord>> {
        self.inner.recent_crawl_logs(user_id, limit)
    }

    fn record_audit(
        &mut self,
        user_id: &str,
        start_url: &str,
        summary: &serde_json::Value,
    ) -> StorageResult<()> {
        self.inner.record_audit(user_id, start_url, summary)
    }

    fn latest_audit(&self, user_id: &str, start_url: &str) -> StorageResult<Option<AuditRecord>> {
        self.inner.latest_audit(user_id, start_url)
    }
}

#[tokio::test]
async fn test_store_fault_fails_session_but_releases_flag() {
    let mut inner = SqliteStore::new_in_memory().unwrap();
    inner.upsert_user("u1", "basic").unwrap();
    let store = share(BrokenLogStore { inner });
    let fetcher = SiteFetcher::new(&[("https://site.test", &page("Home", &[]))]);
    let runner = runner(store.clone(), fetcher, plans(5, 50));

    let (session, frames) = run_session(&runner, "u1", "https://site.test").await;

    assert_eq!(session.unwrap().status, SessionStatus::Failed);
    assert!(frames_of(&frames, "done").is_empty());
    let last = frames.last().unwrap();
    assert_eq!(last["type"], "error");
    assert!(last["message"].as_str().unwrap().contains("disk full"));

    let record = user(&store);
    assert!(!record.is_crawling);
    assert_eq!(record.crawl_usage.websites_crawled, 1);
}
