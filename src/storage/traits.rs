//! Storage traits and error types
//!
//! This module defines the trait interface for account storage backends and
//! associated error types.

use crate::storage::{AuditRecord, CrawlLock, CrawlLogRecord, UserRecord};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage lock poisoned")]
    Poisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for account storage backends
///
/// Holds user plans, monthly usage counters, the single-flight crawl flag,
/// crawl logs and audit summaries. Implementations are used behind a mutex
/// and are not required to be `Sync`.
pub trait AccountStore: Send {
    // ===== Users =====

    /// Gets a user by ID
    fn get_user(&self, user_id: &str) -> StorageResult<Option<UserRecord>>;

    /// Creates a user or changes the plan of an existing one
    fn upsert_user(&mut self, user_id: &str, plan: &str) -> StorageResult<()>;

    // ===== Usage =====

    /// Sets the usage month and zeroes both counters
    fn reset_usage(&mut self, user_id: &str, month: &str) -> StorageResult<()>;

    /// Adds one website and `pages` pages to the counters for `month`
    fn increment_usage(&mut self, user_id: &str, month: &str, pages: u32) -> StorageResult<()>;

    // ===== Single-flight flag =====

    /// Sets the crawl flag with a lease owned by `owner`
    fn acquire_crawl_lock(
        &mut self,
        user_id: &str,
        owner: &str,
        acquired_at: DateTime<Utc>,
    ) -> StorageResult<()>;

    /// Clears the crawl flag and its lease
    ///
    /// With `lease`, the flag is only cleared while it still carries that
    /// exact lease (owner and acquisition time); `None` clears it
    /// unconditionally.
    ///
    /// # Returns
    ///
    /// Whether a flag was cleared
    fn release_crawl_lock(&mut self, user_id: &str, lease: Option<&CrawlLock>) -> StorageResult<bool>;

    /// Clears every crawl flag not owned by `current_owner`
    ///
    /// # Returns
    ///
    /// The IDs of the users whose flag was cleared
    fn clear_stale_locks(&mut self, current_owner: &str) -> StorageResult<Vec<String>>;

    // ===== Crawl logs =====

    /// Appends a crawl log and returns its row ID
    fn append_crawl_log(&mut self, log: &CrawlLogRecord) -> StorageResult<i64>;

    /// Gets the most recent crawl logs for a user, newest first
    fn recent_crawl_logs(&self, user_id: &str, limit: usize) -> StorageResult<Vec<CrawlLogRecord>>;

    // ===== Audits =====

    /// Stores a performance audit summary for a crawled site
    fn record_audit(
        &mut self,
        user_id: &str,
        start_url: &str,
        summary: &serde_json::Value,
    ) -> StorageResult<()>;

    /// Gets the latest audit recorded for a site
    fn latest_audit(&self, user_id: &str, start_url: &str) -> StorageResult<Option<AuditRecord>>;
}

/// Store handle shared between sessions
pub type SharedStore = Arc<Mutex<dyn AccountStore>>;

/// Wraps a concrete store in a [`SharedStore`]
pub fn share<S: AccountStore + 'static>(store: S) -> SharedStore {
    Arc::new(Mutex::new(store))
}

/// Runs `f` with exclusive access to the store
pub fn with_store<T>(
    store: &SharedStore,
    f: impl FnOnce(&mut dyn AccountStore) -> StorageResult<T>,
) -> StorageResult<T> {
    let mut guard = store.lock().map_err(|_| StorageError::Poisoned)?;
    f(&mut *guard)
}
