//! Account usage report
//!
//! This module loads a user's plan, monthly usage, crawl flag and recent
//! crawl logs from storage and prints them for the `--usage` command.

use crate::config::PlanLimits;
use crate::storage::{AccountStore, CrawlLogRecord, StorageError, UserRecord};
use std::collections::BTreeMap;

/// Number of crawl logs shown in the report
pub const RECENT_CRAWLS: usize = 10;

/// Usage summary for one account
#[derive(Debug, Clone)]
pub struct UsageReport {
    pub user: UserRecord,

    /// Limits of the user's plan, if the plan is configured
    pub limits: Option<PlanLimits>,

    /// Most recent crawls, newest first
    pub recent_crawls: Vec<CrawlLogRecord>,
}

impl UsageReport {
    /// Websites left this month, if the plan is known
    pub fn websites_remaining(&self) -> Option<u32> {
        self.limits.map(|limits| {
            limits
                .monthly_website_limit
                .saturating_sub(self.user.crawl_usage.websites_crawled)
        })
    }
}

/// Loads the usage report for `user_id`
///
/// # Arguments
///
/// * `store` - The storage backend to query
/// * `plans` - Configured plans, used to resolve the user's limits
/// * `user_id` - Account to report on
///
/// # Returns
///
/// * `Ok(UsageReport)` - Successfully loaded report
/// * `Err(StorageError)` - The user does not exist or the query failed
pub fn load_usage_report(
    store: &dyn AccountStore,
    plans: &BTreeMap<String, PlanLimits>,
    user_id: &str,
) -> Result<UsageReport, StorageError> {
    let user = store
        .get_user(user_id)?
        .ok_or_else(|| StorageError::UserNotFound(user_id.to_string()))?;
    let limits = plans.get(&user.plan).copied();
    let recent_crawls = store.recent_crawl_logs(user_id, RECENT_CRAWLS)?;

    Ok(UsageReport {
        user,
        limits,
        recent_crawls,
    })
}

/// Prints a usage report to stdout
pub fn print_usage_report(report: &UsageReport) {
    let user = &report.user;
    let usage = &user.crawl_usage;

    println!("=== Crawl Usage: {} ===\n", user.user_id);

    println!("Plan: {}", user.plan);
    match report.limits {
        Some(limits) => {
            println!("  Monthly website limit: {}", limits.monthly_website_limit);
            println!("  Pages per website: {}", limits.per_website_page_limit);
            if let Some(depth) = limits.max_depth {
                println!("  Max depth: {}", depth);
            }
        }
        None => println!("  (plan not configured)"),
    }
    println!();

    println!(
        "Usage for {}:",
        if usage.month.is_empty() { "-" } else { usage.month.as_str() }
    );
    println!("  Websites crawled: {}", usage.websites_crawled);
    println!("  Pages crawled: {}", usage.pages_crawled);
    if let Some(remaining) = report.websites_remaining() {
        println!("  Websites remaining: {}", remaining);
    }
    println!();

    match &user.lock {
        Some(lock) if user.is_crawling => println!(
            "Crawl in progress (owner {}, since {})",
            lock.owner,
            lock.acquired_at.to_rfc3339()
        ),
        _ if user.is_crawling => println!("Crawl in progress"),
        _ => println!("No crawl in progress"),
    }
    println!();

    if report.recent_crawls.is_empty() {
        println!("No crawls recorded.");
        return;
    }

    println!("Recent Crawls ({}):", report.recent_crawls.len());
    for log in &report.recent_crawls {
        println!(
            "  {}  {}  {} pages, {} with issues",
            log.crawled_at.format("%Y-%m-%d %H:%M"),
            log.start_url,
            log.pages_crawled,
            log.issues_found
        );
    }
}
