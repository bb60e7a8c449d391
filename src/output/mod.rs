//! Output module for reports printed by the CLI
//!
//! This module handles:
//! - Loading account usage and recent crawls from storage
//! - Printing the `--usage` report

pub mod stats;

pub use stats::{load_usage_report, print_usage_report, UsageReport};
