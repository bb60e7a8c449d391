//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the AccountStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{AccountStore, StorageError, StorageResult};
use crate::storage::{AuditRecord, CrawlLock, CrawlLogRecord, CrawlUsage, UserRecord};
use crate::CrawlerError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(CrawlerError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, CrawlerError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, CrawlerError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn require_user(&self, user_id: &str) -> StorageResult<()> {
        let exists: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM users WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;

        match exists {
            Some(_) => Ok(()),
            None => Err(StorageError::UserNotFound(user_id.to_string())),
        }
    }
}

fn parse_timestamp(raw: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Serialization(format!("bad timestamp '{}': {}", raw, e)))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<(UserRecord, Option<String>)> {
    let lock_owner: Option<String> = row.get(6)?;
    let lock_at: Option<String> = row.get(7)?;
    let user = UserRecord {
        user_id: row.get(0)?,
        plan: row.get(1)?,
        crawl_usage: CrawlUsage {
            month: row.get(2)?,
            websites_crawled: row.get(3)?,
            pages_crawled: row.get::<_, i64>(4)? as u64,
        },
        is_crawling: row.get(5)?,
        lock: lock_owner.map(|owner| CrawlLock {
            owner,
            acquired_at: DateTime::<Utc>::MIN_UTC,
        }),
    };
    Ok((user, lock_at))
}

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<(CrawlLogRecord, String, String)> {
    let crawled_at: String = row.get(2)?;
    let urls: String = row.get(5)?;
    let log = CrawlLogRecord {
        user_id: row.get(0)?,
        start_url: row.get(1)?,
        crawled_at: DateTime::<Utc>::MIN_UTC,
        pages_crawled: row.get(3)?,
        issues_found: row.get(4)?,
        urls: Vec::new(),
    };
    Ok((log, crawled_at, urls))
}

impl AccountStore for SqliteStore {
    // ===== Users =====

    fn get_user(&self, user_id: &str) -> StorageResult<Option<UserRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT user_id, plan, usage_month, websites_crawled, pages_crawled,
                 is_crawling, lock_owner, lock_acquired_at
                 FROM users WHERE user_id = ?1",
                params![user_id],
                user_from_row,
            )
            .optional()?;

        let Some((mut user, lock_at)) = row else {
            return Ok(None);
        };

        // A lease without a timestamp is treated as infinitely old.
        if let Some(lock) = user.lock.as_mut() {
            if let Some(raw) = lock_at {
                lock.acquired_at = parse_timestamp(&raw)?;
            }
        }

        Ok(Some(user))
    }

    fn upsert_user(&mut self, user_id: &str, plan: &str) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO users (user_id, plan, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET plan = excluded.plan",
            params![user_id, plan, now],
        )?;
        Ok(())
    }

    // ===== Usage =====

    fn reset_usage(&mut self, user_id: &str, month: &str) -> StorageResult<()> {
        self.require_user(user_id)?;
        self.conn.execute(
            "UPDATE users SET usage_month = ?1, websites_crawled = 0, pages_crawled = 0
             WHERE user_id = ?2",
            params![month, user_id],
        )?;
        Ok(())
    }

    fn increment_usage(&mut self, user_id: &str, month: &str, pages: u32) -> StorageResult<()> {
        self.require_user(user_id)?;
        self.conn.execute(
            "UPDATE users SET usage_month = ?1,
             websites_crawled = websites_crawled + 1,
             pages_crawled = pages_crawled + ?2
             WHERE user_id = ?3",
            params![month, pages, user_id],
        )?;
        Ok(())
    }

    // ===== Single-flight flag =====

    fn acquire_crawl_lock(
        &mut self,
        user_id: &str,
        owner: &str,
        acquired_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        self.require_user(user_id)?;
        self.conn.execute(
            "UPDATE users SET is_crawling = 1, lock_owner = ?1, lock_acquired_at = ?2
             WHERE user_id = ?3",
            params![owner, acquired_at.to_rfc3339(), user_id],
        )?;
        Ok(())
    }

    fn release_crawl_lock(&mut self, user_id: &str, lease: Option<&CrawlLock>) -> StorageResult<bool> {
        let changed = match lease {
            Some(lease) => self.conn.execute(
                "UPDATE users SET is_crawling = 0, lock_owner = NULL, lock_acquired_at = NULL
                 WHERE user_id = ?1 AND lock_owner = ?2 AND lock_acquired_at = ?3",
                params![user_id, lease.owner, lease.acquired_at.to_rfc3339()],
            )?,
            None => self.conn.execute(
                "UPDATE users SET is_crawling = 0, lock_owner = NULL, lock_acquired_at = NULL
                 WHERE user_id = ?1 AND is_crawling = 1",
                params![user_id],
            )?,
        };
        Ok(changed > 0)
    }

    fn clear_stale_locks(&mut self, current_owner: &str) -> StorageResult<Vec<String>> {
        let tx = self.conn.transaction()?;

        let stale: Vec<String> = {
            let mut stmt = tx.prepare(
                "SELECT user_id FROM users
                 WHERE is_crawling = 1 AND (lock_owner IS NULL OR lock_owner != ?1)
                 ORDER BY user_id",
            )?;
            let rows = stmt.query_map(params![current_owner], |row| row.get(0))?;
            rows.collect::<Result<Vec<String>, _>>()?
        };

        tx.execute(
            "UPDATE users SET is_crawling = 0, lock_owner = NULL, lock_acquired_at = NULL
             WHERE is_crawling = 1 AND (lock_owner IS NULL OR lock_owner != ?1)",
            params![current_owner],
        )?;
        tx.commit()?;

        Ok(stale)
    }

    // ===== Crawl logs =====

    fn append_crawl_log(&mut self, log: &CrawlLogRecord) -> StorageResult<i64> {
        let urls = serde_json::to_string(&log.urls)?;
        self.conn.execute(
            "INSERT INTO crawl_logs (user_id, start_url, crawled_at, pages_crawled, issues_found, urls)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                log.user_id,
                log.start_url,
                log.crawled_at.to_rfc3339(),
                log.pages_crawled,
                log.issues_found,
                urls
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn recent_crawl_logs(&self, user_id: &str, limit: usize) -> StorageResult<Vec<CrawlLogRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, start_url, crawled_at, pages_crawled, issues_found, urls
             FROM crawl_logs WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(params![user_id, limit as i64], log_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut logs = Vec::with_capacity(rows.len());
        for (mut log, crawled_at, urls) in rows {
            log.crawled_at = parse_timestamp(&crawled_at)?;
            log.urls = serde_json::from_str(&urls)?;
            logs.push(log);
        }

        Ok(logs)
    }

    // ===== Audits =====

    fn record_audit(
        &mut self,
        user_id: &str,
        start_url: &str,
        summary: &serde_json::Value,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO audits (user_id, start_url, summary, status, created_at)
             VALUES (?1, ?2, ?3, 'completed', ?4)",
            params![user_id, start_url, serde_json::to_string(summary)?, now],
        )?;
        Ok(())
    }

    fn latest_audit(&self, user_id: &str, start_url: &str) -> StorageResult<Option<AuditRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, user_id, start_url, summary, status, created_at
                 FROM audits WHERE user_id = ?1 AND start_url = ?2
                 ORDER BY id DESC LIMIT 1",
                params![user_id, start_url],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((id, user_id, start_url, summary, status, created_at)) => Ok(Some(AuditRecord {
                id,
                user_id,
                start_url,
                summary: serde_json::from_str(&summary)?,
                status,
                created_at,
            })),
            None => Ok(None),
        }
    }
}
