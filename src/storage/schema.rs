//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the account database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Accounts, their plan and monthly usage
CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY,
    plan TEXT NOT NULL,
    usage_month TEXT NOT NULL DEFAULT '',
    websites_crawled INTEGER NOT NULL DEFAULT 0,
    pages_crawled INTEGER NOT NULL DEFAULT 0,
    is_crawling INTEGER NOT NULL DEFAULT 0,
    lock_owner TEXT,
    lock_acquired_at TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_crawling ON users(is_crawling);

-- One row per finished crawl session
CREATE TABLE IF NOT EXISTS crawl_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL REFERENCES users(user_id),
    start_url TEXT NOT NULL,
    crawled_at TEXT NOT NULL,
    pages_crawled INTEGER NOT NULL,
    issues_found INTEGER NOT NULL,
    urls TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_crawl_logs_user ON crawl_logs(user_id);

-- Performance audit summaries
CREATE TABLE IF NOT EXISTS audits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL REFERENCES users(user_id),
    start_url TEXT NOT NULL,
    summary TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audits_site ON audits(user_id, start_url);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Gets the current schema version
pub fn get_schema_version() -> u32 {
    1
}
