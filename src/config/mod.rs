//! Configuration module for the crawler service
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use pinch_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("pinch.toml")).unwrap();
//! println!("Fetching {} pages at a time", config.crawler.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AuditConfig, Config, CrawlerConfig, PlanLimits, QuotaConfig, ServerConfig, StorageConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
