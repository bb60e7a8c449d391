//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The per-session frontier and its scope filters
//! - Page fetching behind the `PageFetcher` collaborator
//! - HTML feature and link extraction
//! - Per-page processing and rule evaluation
//! - Session orchestration with bounded parallelism

mod fetcher;
mod frontier;
mod orchestrator;
mod parser;
mod processor;

pub use fetcher::{
    build_http_client, fetch_snapshot, FetchPage, HttpFetcher, PageFault, PageFetcher, PageSnapshot,
};
pub use frontier::{EnqueueOutcome, Frontier, FrontierEntry, SkipReason};
pub use orchestrator::{Orchestrator, SessionRunner};
pub use parser::{parse_html, PageFeatures, ParsedPage};
pub use processor::{PageProcessor, PageResult};
