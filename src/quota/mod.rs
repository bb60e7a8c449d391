//! Per-account admission control
//!
//! The quota guard is the only component that touches the single-flight
//! crawl flag and the monthly usage counters. Admission is serialized per
//! process; finalization always clears the flag this session set, even when
//! recording usage fails.

use crate::config::PlanLimits;
use crate::storage::{with_store, CrawlLock, CrawlUsage, SharedStore, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex as StdMutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::Mutex;

/// Reasons a crawl may not start
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("User not found")]
    UserNotFound,

    #[error("A crawl is already in progress. Please wait for it to finish.")]
    ConcurrencyConflict,

    #[error("Subscription plan not recognized.")]
    UnknownPlan,

    #[error("You've reached your monthly crawl limit ({limit})")]
    QuotaExceeded { limit: u32 },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Granted admission; the crawl flag is set on the caller's behalf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub user_id: String,
    pub plan: String,
    pub limits: PlanLimits,
    /// Month the usage will be counted against
    pub month: String,
    /// Usage before this crawl
    pub usage: CrawlUsage,
    /// Lease written with the flag; only this lease is released later
    pub lease: CrawlLock,
}

/// Formats the UTC month key (`YYYY-MM`) for `now`
pub fn month_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m").to_string()
}

/// Gatekeeper for crawl sessions
pub struct QuotaGuard {
    store: SharedStore,
    plans: BTreeMap<String, PlanLimits>,
    instance_id: String,
    stale_after: chrono::Duration,
    admission: Mutex<()>,
    /// Users with a session running in this process, with their lease time
    live: StdMutex<HashMap<String, DateTime<Utc>>>,
}

impl QuotaGuard {
    /// Creates a guard for this process
    ///
    /// # Arguments
    ///
    /// * `store` - Account storage
    /// * `plans` - Plan limits keyed by plan name
    /// * `instance_id` - Unique ID of this process, written into every lease
    /// * `stale_lock_secs` - Age after which a lease of this instance with no
    ///   running session behind it is considered abandoned
    pub fn new(
        store: SharedStore,
        plans: BTreeMap<String, PlanLimits>,
        instance_id: impl Into<String>,
        stale_lock_secs: u64,
    ) -> Self {
        Self {
            store,
            plans,
            instance_id: instance_id.into(),
            stale_after: chrono::Duration::seconds(stale_lock_secs as i64),
            admission: Mutex::new(()),
            live: StdMutex::new(HashMap::new()),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Decides whether `user_id` may start a crawl at `now`
    ///
    /// Checks run in this order: account exists, crawl flag (stale flags are
    /// reclaimed), plan, month rollover, monthly website cap. On success the
    /// flag is set with a lease owned by this instance before returning.
    pub async fn admit(&self, user_id: &str, now: DateTime<Utc>) -> Result<Admission, AdmissionError> {
        let _serial = self.admission.lock().await;

        let user = with_store(&self.store, |s| s.get_user(user_id))?
            .ok_or(AdmissionError::UserNotFound)?;

        if self.is_live(user_id) {
            return Err(AdmissionError::ConcurrencyConflict);
        }
        if user.is_crawling {
            if !self.is_stale(user.lock.as_ref(), now) {
                return Err(AdmissionError::ConcurrencyConflict);
            }
            tracing::warn!(
                "Reclaiming stale crawl flag for user {} (lease {:?})",
                user_id,
                user.lock
            );
            with_store(&self.store, |s| s.release_crawl_lock(user_id, user.lock.as_ref()))?;
        }

        let limits = *self
            .plans
            .get(&user.plan)
            .ok_or(AdmissionError::UnknownPlan)?;

        let month = month_key(now);
        let mut usage = user.crawl_usage;
        if usage.month != month {
            tracing::info!(
                "Resetting usage for user {} ({} -> {})",
                user_id,
                if usage.month.is_empty() { "none" } else { usage.month.as_str() },
                month
            );
            with_store(&self.store, |s| s.reset_usage(user_id, &month))?;
            usage = CrawlUsage {
                month: month.clone(),
                ..Default::default()
            };
        }

        if usage.websites_crawled >= limits.monthly_website_limit {
            return Err(AdmissionError::QuotaExceeded {
                limit: limits.monthly_website_limit,
            });
        }

        with_store(&self.store, |s| {
            s.acquire_crawl_lock(user_id, &self.instance_id, now)
        })?;
        self.live_sessions().insert(user_id.to_string(), now);

        tracing::info!(
            "Admitted crawl for user {} on plan {} ({}/{} websites this month)",
            user_id,
            user.plan,
            usage.websites_crawled,
            limits.monthly_website_limit
        );

        Ok(Admission {
            user_id: user_id.to_string(),
            plan: user.plan,
            limits,
            month,
            usage,
            lease: CrawlLock {
                owner: self.instance_id.clone(),
                acquired_at: now,
            },
        })
    }

    /// Records a finished session and clears its crawl flag
    ///
    /// The flag is cleared even when the usage update fails; the first error
    /// is returned.
    pub fn finalize(&self, admission: &Admission, pages_visited: u32) -> StorageResult<()> {
        let counted = with_store(&self.store, |s| {
            s.increment_usage(&admission.user_id, &admission.month, pages_visited)
        });
        if let Err(e) = &counted {
            tracing::error!("Failed to record usage for {}: {}", admission.user_id, e);
        }

        let released = self.release(admission);
        counted.and(released)
    }

    /// Clears the crawl flag set by `admission`
    ///
    /// A flag that now carries a different lease belongs to another session
    /// and is left alone.
    pub fn release(&self, admission: &Admission) -> StorageResult<()> {
        {
            let mut live = self.live_sessions();
            if live.get(&admission.user_id) == Some(&admission.lease.acquired_at) {
                live.remove(&admission.user_id);
            }
        }

        let cleared = with_store(&self.store, |s| {
            s.release_crawl_lock(&admission.user_id, Some(&admission.lease))
        })
        .map_err(|e| {
            tracing::error!("Failed to clear crawl flag for {}: {}", admission.user_id, e);
            e
        })?;
        if !cleared {
            tracing::debug!(
                "Crawl flag for {} no longer carries lease {:?}, left in place",
                admission.user_id,
                admission.lease
            );
        }
        Ok(())
    }

    /// Clears every crawl flag left behind by other process instances
    pub fn recover_stale_locks(&self) -> StorageResult<Vec<String>> {
        let cleared = with_store(&self.store, |s| s.clear_stale_locks(&self.instance_id))?;
        if !cleared.is_empty() {
            tracing::warn!("Recovered {} stale crawl flags: {:?}", cleared.len(), cleared);
        }
        Ok(cleared)
    }

    fn live_sessions(&self) -> MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_live(&self, user_id: &str) -> bool {
        self.live_sessions().contains_key(user_id)
    }

    /// A lease of this instance is only stale once no session here holds it
    /// and it has aged past `stale_after`
    fn is_stale(&self, lock: Option<&CrawlLock>, now: DateTime<Utc>) -> bool {
        match lock {
            None => true,
            Some(lock) => lock.owner != self.instance_id || now - lock.acquired_at > self.stale_after,
        }
    }
}

/// Admission owned by a running session
///
/// Dropping it without [`HeldAdmission::finalize`] (a panic or an aborted
/// task) releases the session's own flag.
pub struct HeldAdmission<'a> {
    guard: &'a QuotaGuard,
    admission: Option<Admission>,
}

impl<'a> HeldAdmission<'a> {
    pub fn new(guard: &'a QuotaGuard, admission: Admission) -> Self {
        Self {
            guard,
            admission: Some(admission),
        }
    }

    /// Counts the session's usage and releases its flag
    pub fn finalize(mut self, pages_visited: u32) -> StorageResult<()> {
        match self.admission.take() {
            Some(admission) => self.guard.finalize(&admission, pages_visited),
            None => Ok(()),
        }
    }
}

impl Drop for HeldAdmission<'_> {
    fn drop(&mut self) {
        if let Some(admission) = self.admission.take() {
            tracing::warn!(
                "Session for user {} ended without finalizing, releasing its crawl flag",
                admission.user_id
            );
            let _ = self.guard.release(&admission);
        }
    }
}
