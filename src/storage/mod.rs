//! Storage module for persisting account data
//!
//! This module handles all database operations for the service, including:
//! - SQLite database initialization and schema management
//! - User plans and monthly crawl usage
//! - The per-user single-flight crawl flag and its lease
//! - Crawl logs and performance audit summaries

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{share, with_store, AccountStore, SharedStore, StorageError, StorageResult};

use crate::CrawlerError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Opens (or creates) the account database at `path`
pub fn open_storage(path: &Path) -> Result<SqliteStore, CrawlerError> {
    SqliteStore::new(path)
}

/// Monthly usage counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlUsage {
    /// UTC month key, `YYYY-MM`
    pub month: String,
    pub websites_crawled: u32,
    pub pages_crawled: u64,
}

/// Lease attached to a set crawl flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlLock {
    /// Instance ID of the process that set the flag
    pub owner: String,
    pub acquired_at: DateTime<Utc>,
}

/// Represents a user in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub user_id: String,
    pub plan: String,
    pub crawl_usage: CrawlUsage,
    pub is_crawling: bool,
    #[serde(skip)]
    pub lock: Option<CrawlLock>,
}

/// Represents a finished crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlLogRecord {
    pub user_id: String,
    pub start_url: String,
    pub crawled_at: DateTime<Utc>,
    pub pages_crawled: u32,
    pub issues_found: u32,
    pub urls: Vec<String>,
}

/// Represents a stored performance audit
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub id: i64,
    pub user_id: String,
    pub start_url: String,
    pub summary: serde_json::Value,
    pub status: String,
    pub created_at: String,
}
