//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlSession`: counters, crawled URLs and per-page issues of one crawl
//! - `SessionStatus`: the pending / running / completed / failed lifecycle

mod session;

pub use session::{CrawlSession, PageIssues, SessionStatus};
